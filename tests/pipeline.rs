mod support;

use stillvid::{CollectingReporter, RenderOutcome, RenderRequest, StillvidError};
use support::{FailAt, entries, fixture, harness, temp_dir};

#[test]
fn short_track_loops_a_ten_second_seed() {
    let root = temp_dir("pipeline_e2e");
    let form = fixture(&root);
    let h = harness(Ok(45.0), FailAt::Nowhere);

    let mut progress = CollectingReporter::default();
    let outcome = h.pipeline.run_form(&form, &mut progress);

    let out = root.join("out").join("song.mp4");
    assert_eq!(outcome, RenderOutcome::Success { path: out.clone() });
    assert!(out.is_file());

    let rec = h.encodes.snapshot();
    assert_eq!(rec.seeds.len(), 1);
    assert_eq!(rec.seeds[0].seconds, 10);
    assert_eq!((rec.seeds[0].width, rec.seeds[0].height), (128, 128));
    assert!(rec.frame_seen);

    assert_eq!(rec.manifest_lines.len(), 5);
    let expected = format!("file '{}'", rec.seeds[0].out_path.display());
    assert!(rec.manifest_lines.iter().all(|l| *l == expected));
    assert!(rec.seeds[0].out_path.is_absolute());

    assert_eq!(rec.muxes.len(), 1);
    assert_eq!(rec.muxes[0].duration_secs, 45.0);
    assert_eq!(rec.muxes[0].audio_bitrate_kbps, 256);
    assert_eq!(rec.muxes[0].out_path, out);

    // Only the final video is left behind.
    assert_eq!(entries(&root.join("out")), ["song.mp4"]);

    assert_eq!(
        progress.messages,
        [
            "Analyzing audio duration...",
            "Composing frame...",
            "Encoding seed segment (10s, 128x128)...",
            "Muxing final video (256k)...",
        ]
    );

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn long_track_uses_longer_seed_and_fewer_loops() {
    let root = temp_dir("pipeline_long");
    let form = fixture(&root);
    let h = harness(Ok(1250.0), FailAt::Nowhere);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    assert!(outcome.is_success());

    let rec = h.encodes.snapshot();
    assert_eq!(rec.seeds[0].seconds, 240);
    assert_eq!(rec.manifest_lines.len(), 6);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn explicit_seed_and_portrait_are_honoured() {
    let root = temp_dir("pipeline_explicit");
    let mut form = fixture(&root);
    form.seed = "60s".to_string();
    form.resolution = "1280x720".to_string();
    form.portrait = true;
    let h = harness(Ok(125.0), FailAt::Nowhere);

    assert!(
        h.pipeline
            .run_form(&form, &mut CollectingReporter::default())
            .is_success()
    );

    let rec = h.encodes.snapshot();
    assert_eq!(rec.seeds[0].seconds, 60);
    assert_eq!((rec.seeds[0].width, rec.seeds[0].height), (720, 1280));
    assert_eq!(rec.manifest_lines.len(), 3);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn probe_failure_reports_and_leaves_nothing_behind() {
    let root = temp_dir("pipeline_probe_fail");
    let form = fixture(&root);
    let h = harness(Err("ffprobe exited with status 1".to_string()), FailAt::Nowhere);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("probe error:"), "{message}");
    assert!(message.contains("status 1"));

    assert_eq!(h.probes.count(), 1);
    assert!(h.encodes.snapshot().seeds.is_empty());
    assert!(entries(&root.join("out")).is_empty());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn absurd_duration_fails_without_encoding() {
    let root = temp_dir("pipeline_huge_duration");
    let form = fixture(&root);
    let h = harness(Ok(1e300), FailAt::Nowhere);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("invalid setting:"), "{message}");
    assert!(h.encodes.snapshot().seeds.is_empty());
    assert!(entries(&root.join("out")).is_empty());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn malformed_resolution_fails_before_any_tool_runs() {
    let root = temp_dir("pipeline_bad_res");
    let mut form = fixture(&root);
    form.resolution = "1920".to_string();
    let h = harness(Ok(45.0), FailAt::Nowhere);

    let mut progress = CollectingReporter::default();
    let outcome = h.pipeline.run_form(&form, &mut progress);
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("invalid resolution:"), "{message}");
    assert_eq!(h.probes.count(), 0);
    assert!(h.encodes.snapshot().seeds.is_empty());
    assert!(progress.messages.is_empty());
    assert!(!root.join("out").exists());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn seed_failure_cleans_the_work_dir() {
    let root = temp_dir("pipeline_seed_fail");
    let form = fixture(&root);
    let h = harness(Ok(45.0), FailAt::Seed);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert_eq!(message, "encode error (seed): exit status: 1");

    let rec = h.encodes.snapshot();
    assert!(rec.muxes.is_empty());
    assert!(!rec.seeds[0].frame_path.exists());
    assert!(entries(&root.join("out")).is_empty());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn mux_failure_removes_partial_output() {
    let root = temp_dir("pipeline_mux_fail");
    let form = fixture(&root);
    let h = harness(Ok(45.0), FailAt::Mux);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("encode error (mux):"), "{message}");
    assert!(entries(&root.join("out")).is_empty());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn mux_failure_keeps_a_pre_existing_file_it_was_allowed_to_overwrite() {
    let root = temp_dir("pipeline_mux_fail_clobber");
    let mut form = fixture(&root);
    form.no_clobber = false;
    std::fs::create_dir_all(root.join("out")).unwrap();
    std::fs::write(root.join("out").join("song.mp4"), b"old").unwrap();
    let h = harness(Ok(45.0), FailAt::Mux);

    assert!(
        !h.pipeline
            .run_form(&form, &mut CollectingReporter::default())
            .is_success()
    );
    assert_eq!(entries(&root.join("out")), ["song.mp4"]);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn no_clobber_appends_counter_suffix() {
    let root = temp_dir("pipeline_no_clobber");
    let form = fixture(&root);
    let out = root.join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("song.mp4"), b"old").unwrap();
    std::fs::write(out.join("song-000.mp4"), b"old").unwrap();

    let h = harness(Ok(45.0), FailAt::Nowhere);
    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    assert_eq!(
        outcome,
        RenderOutcome::Success {
            path: out.join("song-001.mp4")
        }
    );
    assert_eq!(
        entries(&out),
        ["song-000.mp4", "song-001.mp4", "song.mp4"]
    );

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn clobber_overwrites_in_place() {
    let root = temp_dir("pipeline_clobber");
    let mut form = fixture(&root);
    form.no_clobber = false;
    let out = root.join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("song.mp4"), b"old").unwrap();

    let h = harness(Ok(45.0), FailAt::Nowhere);
    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    assert_eq!(
        outcome,
        RenderOutcome::Success {
            path: out.join("song.mp4")
        }
    );
    assert_eq!(std::fs::read(out.join("song.mp4")).unwrap(), b"video");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn unreadable_image_is_an_io_failure() {
    let root = temp_dir("pipeline_bad_image");
    let mut form = fixture(&root);
    let bogus = root.join("in").join("broken.png");
    std::fs::write(&bogus, b"definitely not a png").unwrap();
    form.image = bogus.to_string_lossy().into_owned();
    let h = harness(Ok(45.0), FailAt::Nowhere);

    let outcome = h.pipeline.run_form(&form, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("io error:"), "{message}");
    assert!(h.encodes.snapshot().seeds.is_empty());
    assert!(entries(&root.join("out")).is_empty());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn output_dir_below_a_file_is_an_invalid_path() {
    let root = temp_dir("pipeline_bad_dir");
    let mut form = fixture(&root);
    let file = root.join("in").join("song.mp3");
    form.output_dir = file.join("sub").to_string_lossy().into_owned();
    let h = harness(Ok(45.0), FailAt::Nowhere);

    let request = RenderRequest::resolve(&form, h.pipeline.defaults()).unwrap();
    let outcome = h.pipeline.run(&request, &mut CollectingReporter::default());
    let RenderOutcome::Failure { message } = outcome else {
        panic!("expected failure");
    };
    assert!(message.starts_with("invalid path:"), "{message}");
    assert_eq!(h.probes.count(), 0);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn request_resolution_errors_keep_their_kind() {
    let root = temp_dir("pipeline_req_kind");
    let mut form = fixture(&root);
    form.seed = "whenever".to_string();
    let h = harness(Ok(45.0), FailAt::Nowhere);

    assert!(matches!(
        RenderRequest::resolve(&form, h.pipeline.defaults()),
        Err(StillvidError::InvalidSetting(_))
    ));

    std::fs::remove_dir_all(&root).ok();
}

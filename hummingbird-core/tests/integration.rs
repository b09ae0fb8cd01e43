//! Integration tests — full generator runs through the in-memory sink
//! and through real subprocess encoders.

use hummingbird_core::stream::{FRAME_MARKER, header, payload_len};
use hummingbird_core::{
    EncoderCommand, EncoderExit, Frame, FrameGenerator, GeneratorConfig, HummingbirdError,
    MemorySink, PixelFormat, PixelRemapper, ProjectorGeometry, SLOTS_PER_MACRO_FRAME, SyncMode,
    interleave, subframe,
};

// ── Helpers ──────────────────────────────────────────────────────

fn small_geometry() -> ProjectorGeometry {
    ProjectorGeometry {
        logical_width: 6,
        logical_height: 5,
        physical_columns: 12,
        physical_rows: 10,
        horizontal_offset: 2,
    }
}

fn small_config(framerate: u32) -> GeneratorConfig {
    GeneratorConfig {
        framerate,
        corner_size: 2,
        geometry: small_geometry(),
        ..GeneratorConfig::default()
    }
}

/// Deterministic on/off pattern varying with position and frame index.
fn pattern_frame(geometry: &ProjectorGeometry, index: usize) -> Frame {
    let mut data = Vec::with_capacity(geometry.logical_len());
    for y in 0..geometry.logical_height as usize {
        for x in 0..geometry.logical_width as usize {
            let on = (x * 7 + y * 13 + index * 31) % 5 < 2;
            data.push(if on { 255 } else { 0 });
        }
    }
    Frame::new(
        geometry.logical_width,
        geometry.logical_height,
        PixelFormat::Gray8,
        data,
    )
    .unwrap()
}

/// Split a stream into its payloads, checking header and markers.
fn payloads<'a>(bytes: &'a [u8], geometry: &ProjectorGeometry) -> Vec<&'a [u8]> {
    let header = header(geometry);
    assert!(bytes.starts_with(header.as_bytes()), "missing header");
    let body = &bytes[header.len()..];
    let frame_len = FRAME_MARKER.len() + payload_len(geometry);
    assert_eq!(body.len() % frame_len, 0, "truncated frame");
    body.chunks_exact(frame_len)
        .map(|frame| {
            assert_eq!(&frame[..FRAME_MARKER.len()], FRAME_MARKER);
            &frame[FRAME_MARKER.len()..]
        })
        .collect()
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("hummingbird-{}-{name}", std::process::id()))
}

// ── Frame counts ─────────────────────────────────────────────────

#[test]
fn macro_frame_count_follows_framerate() {
    for framerate in [1440, 720, 480, 360, 240, 120, 60] {
        for duration_halves in [1u32, 2, 3] {
            let cfg = small_config(framerate);
            let geometry = cfg.geometry;
            let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();
            assert_eq!(generator.replicates(), 1440 / framerate);

            let frames = framerate * duration_halves / 2;
            for index in 0..frames as usize {
                generator.push(&pattern_frame(&geometry, index)).unwrap();
            }
            let expected = (1440 * duration_halves / 2 / 24) as u64;
            assert_eq!(generator.macro_frames(), expected, "{framerate} fps");

            let sink = generator.finish().unwrap();
            assert_eq!(payloads(sink.bytes(), &geometry).len() as u64, expected);
        }
    }
}

// ── Bit fidelity ─────────────────────────────────────────────────

#[test]
fn sub_frames_round_trip_through_the_stream() {
    let cfg = small_config(1440);
    let geometry = cfg.geometry;
    let remapper = PixelRemapper::new(geometry).unwrap();
    let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();

    // 2.5 cycles: the trailing half-cycle must not leak into frame 2.
    let frames: Vec<Frame> = (0..60).map(|i| pattern_frame(&geometry, i)).collect();
    for frame in &frames {
        generator.push(frame).unwrap();
    }
    let sink = generator.finish().unwrap();
    let payloads = payloads(sink.bytes(), &geometry);
    assert_eq!(payloads.len(), 2);

    for (cycle, payload) in payloads.iter().enumerate() {
        let rgb = interleave(payload, &geometry).unwrap();
        for slot in 0..SLOTS_PER_MACRO_FRAME {
            let source = &frames[cycle * SLOTS_PER_MACRO_FRAME + slot];
            let expected: Vec<u8> = source.data.iter().map(|&v| (v > 127) as u8).collect();
            let shown = remapper.gather(&subframe(&rgb, slot));
            assert_eq!(shown, expected, "cycle {cycle} slot {slot}");
        }
    }
}

#[test]
fn replicated_frames_fill_consecutive_slots() {
    let cfg = small_config(480);
    let geometry = cfg.geometry;
    let remapper = PixelRemapper::new(geometry).unwrap();
    let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();

    let frames: Vec<Frame> = (0..8).map(|i| pattern_frame(&geometry, i)).collect();
    for frame in &frames {
        generator.push(frame).unwrap();
    }
    let sink = generator.finish().unwrap();
    let payloads = payloads(sink.bytes(), &geometry);
    let rgb = interleave(payloads[0], &geometry).unwrap();
    for slot in 0..SLOTS_PER_MACRO_FRAME {
        let source = &frames[slot / 3];
        let expected: Vec<u8> = source.data.iter().map(|&v| (v > 127) as u8).collect();
        assert_eq!(remapper.gather(&subframe(&rgb, slot)), expected, "slot {slot}");
    }
}

// ── Reference projector ──────────────────────────────────────────

#[test]
fn white_frames_light_the_whole_diamond() {
    let cfg = GeneratorConfig::new("unused.mp4");
    let geometry = cfg.geometry;
    let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();
    for _ in 0..24 {
        generator.push(&Frame::filled(343, 342, 255).unwrap()).unwrap();
    }
    let sink = generator.finish().unwrap();
    let bytes = sink.bytes();
    assert!(bytes.starts_with(b"YUV4MPEG2 W1216 H684 F60:1 Ip C420\nFRAME\n"));

    let payloads = payloads(bytes, &geometry);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].len(), 608 * 684 * 3);

    let rgb = interleave(payloads[0], &geometry).unwrap();
    let remapper = PixelRemapper::new(geometry).unwrap();
    for channel in 0..3 {
        let plane: Vec<u8> = rgb.chunks_exact(3).map(|p| p[channel]).collect();
        assert!(remapper.gather(&plane).iter().all(|&v| v == 0xFF));
        // Empty sync sequence: nothing outside the diamond is lit.
        assert_eq!(plane.iter().filter(|&&v| v != 0).count(), 343 * 342);
    }
}

#[test]
fn oversampled_rgb_capture_matches_exact_capture() {
    let geometry = ProjectorGeometry::default();
    let (w, h) = (geometry.logical_width as usize, geometry.logical_height as usize);

    let mut exact = Vec::with_capacity(w * h);
    let mut doubled = vec![0u8; w * 2 * h * 2 * 3];
    for y in 0..h {
        for x in 0..w {
            let on = (x / 10 + y / 10) % 2 == 0;
            let value = if on { 255 } else { 0 };
            exact.push(value);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let offset = ((2 * y + dy) * w * 2 + 2 * x + dx) * 3;
                doubled[offset..offset + 3].fill(value);
            }
        }
    }
    let exact = Frame::new(343, 342, PixelFormat::Gray8, exact).unwrap();
    let doubled = Frame::new(686, 684, PixelFormat::Rgb8, doubled).unwrap();

    let run = |frame: &Frame| {
        let mut generator =
            FrameGenerator::with_sink(GeneratorConfig::default(), MemorySink::new()).unwrap();
        for _ in 0..24 {
            generator.push(frame).unwrap();
        }
        generator.finish().unwrap().into_bytes()
    };
    assert_eq!(run(&exact), run(&doubled));
}

#[test]
fn mismatched_frame_is_rejected_without_side_effects() {
    let mut generator =
        FrameGenerator::with_sink(GeneratorConfig::default(), MemorySink::new()).unwrap();
    generator.push(&Frame::filled(343, 342, 255).unwrap()).unwrap();
    for (w, h) in [(342, 343), (686, 342), (344, 342), (1372, 1368)] {
        let err = generator.push(&Frame::filled(w, h, 255).unwrap()).unwrap_err();
        assert!(matches!(err, HummingbirdError::SizeMismatch { .. }), "{w}x{h}");
    }
    assert_eq!(generator.slot(), 1);
    assert_eq!(generator.frames_pushed(), 1);
}

// ── Sync corner ──────────────────────────────────────────────────

#[test]
fn sync_values_are_stamped_in_order_then_stop() {
    let cfg = GeneratorConfig {
        synchronization_pattern: vec![0xFF, 0x00, 0xA5],
        ..small_config(1440)
    };
    let geometry = cfg.geometry;
    let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();
    for _ in 0..24 * 5 {
        generator.push(&Frame::filled(6, 5, 0).unwrap()).unwrap();
    }
    assert_eq!(generator.sync_remaining(), 0);
    let sink = generator.finish().unwrap();

    let corner = geometry.physical_columns as usize - 1;
    let stamped: Vec<[u8; 3]> = payloads(sink.bytes(), &geometry)
        .iter()
        .map(|payload| {
            let rgb = interleave(payload, &geometry).unwrap();
            [rgb[corner * 3], rgb[corner * 3 + 1], rgb[corner * 3 + 2]]
        })
        .collect();
    let expected: [[u8; 3]; 5] = [
        [0xFF, 0xFF, 0xFF],
        [0x00, 0x00, 0x00],
        [0xA5, 0xA5, 0xA5],
        [0x00, 0x00, 0x00],
        [0x00, 0x00, 0x00],
    ];
    assert_eq!(stamped, expected);
}

#[test]
fn per_channel_sync_spreads_values_over_planes() {
    let cfg = GeneratorConfig {
        synchronization_pattern: vec![1, 2, 3, 4],
        sync_mode: SyncMode::PerChannel,
        ..small_config(1440)
    };
    let geometry = cfg.geometry;
    let mut generator = FrameGenerator::with_sink(cfg, MemorySink::new()).unwrap();
    for _ in 0..24 * 3 {
        generator.push(&Frame::filled(6, 5, 0).unwrap()).unwrap();
    }
    let sink = generator.finish().unwrap();

    let corner = geometry.physical_columns as usize - 1;
    let stamped: Vec<Vec<u8>> = payloads(sink.bytes(), &geometry)
        .iter()
        .map(|payload| {
            let rgb = interleave(payload, &geometry).unwrap();
            rgb[corner * 3..corner * 3 + 3].to_vec()
        })
        .collect();
    assert_eq!(stamped, [vec![1u8, 2, 3], vec![4, 0, 0], vec![0, 0, 0]]);
}

// ── Subprocess encoders ──────────────────────────────────────────

#[cfg(unix)]
#[test]
fn stream_reaches_the_encoder_output() {
    let output = temp_path("stream.y4m");
    let cfg = GeneratorConfig {
        output: output.clone(),
        encoder: EncoderCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "cat > \"$0\"".into(), "{output}".into()],
        },
        ..small_config(720)
    };
    let geometry = cfg.geometry;
    let mut generator = FrameGenerator::spawn(cfg).unwrap();
    for index in 0..24 {
        generator.push(&pattern_frame(&geometry, index)).unwrap();
    }
    assert_eq!(generator.macro_frames(), 2);
    generator.close().unwrap();
    generator.close().unwrap();

    let mut process = generator.finish().unwrap();
    assert!(process.wait().unwrap().success());

    let bytes = std::fs::read(&output).unwrap();
    std::fs::remove_file(&output).ok();
    assert_eq!(payloads(&bytes, &geometry).len(), 2);
}

#[cfg(unix)]
#[test]
fn dead_encoder_is_reported_with_its_stderr() {
    let cfg = GeneratorConfig {
        encoder: EncoderCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "echo 'Unknown encoder libx264' >&2; exit 1".into()],
        },
        ..small_config(1440)
    };
    let mut generator = FrameGenerator::spawn(cfg).unwrap();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = generator.encoder_exit().unwrap() {
            break exit;
        }
        assert!(std::time::Instant::now() < deadline, "encoder never exited");
        std::thread::sleep(std::time::Duration::from_millis(10));
    };
    assert_eq!(exit.code, Some(1));

    match generator.push(&Frame::filled(6, 5, 0).unwrap()) {
        Err(HummingbirdError::EncoderTerminated(EncoderExit { code, stderr, .. })) => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr.trim(), "Unknown encoder libx264");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    // The stream was never flushed to a dead pipe; closing may report
    // the broken pipe, but must not panic or hang.
    let _ = generator.close();
    assert!(generator.close().is_ok());
}

#[test]
fn unknown_encoder_is_unavailable() {
    let cfg = GeneratorConfig {
        encoder: EncoderCommand {
            program: "hummingbird-missing-encoder".into(),
            args: Vec::new(),
        },
        ..small_config(1440)
    };
    assert!(matches!(
        FrameGenerator::spawn(cfg),
        Err(HummingbirdError::EncoderUnavailable { .. })
    ));
}

//! # Integration Tests
//!
//! End-to-end tests over the full annotation loop, all against the
//! in-process mock transport (no camera hardware or inference service
//! required).

#[cfg(test)]
mod contract_tests {
    use contracts::{
        AnnotationResult, FramePayload, WireEnvelope, EVENT_BOUNDING_BOX, EVENT_FRAME,
    };
    use serde_json::json;

    #[test]
    fn test_frame_payload_wire_shape() {
        // The exact JSON the inference service expects per frame
        let payload = serde_json::to_value(FramePayload {
            frame: "aGVsbG8=".into(),
        })
        .unwrap();
        let envelope = WireEnvelope::new(EVENT_FRAME, payload);

        let text = serde_json::to_string(&envelope).unwrap();
        assert_eq!(text, r#"{"event":"frame","data":{"frame":"aGVsbG8="}}"#);
    }

    #[test]
    fn test_service_payload_shape() {
        // The exact JSON the inference service emits
        let envelope: WireEnvelope = serde_json::from_value(json!({
            "event": "bounding_box",
            "data": {
                "x": 12, "y": 34, "w": 56, "h": 78,
                "colorRectangle": [0, 255, 0],
                "orientation": "left",
                "text4User": "hello",
                "textFacDis": "2.1 m"
            }
        }))
        .unwrap();

        assert_eq!(envelope.event, EVENT_BOUNDING_BOX);
        let result: AnnotationResult = serde_json::from_value(envelope.data).unwrap();
        assert_eq!(result.color, [0, 255, 0]);
        assert_eq!(result.text_for_user, "hello");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use channel::{ChannelHandle, ChannelManager, ChannelOptions, MockTransport};
    use capture::{CaptureScheduler, FrameEncoder, SyntheticCamera};
    use contracts::{
        CameraPrefs, ConnectionState, FrameSource, SendSlot, WireEnvelope, EVENT_BOUNDING_BOX,
        EVENT_FRAME,
    };
    use overlay::{BufferDisplay, Correlator};
    use rate_control::PaceController;
    use serde_json::json;
    use tokio::sync::watch;
    use tokio::time::{sleep, timeout};

    fn small_prefs() -> CameraPrefs {
        CameraPrefs {
            width: 64,
            height: 48,
            frame_rate: 30.0,
            device_id: "synthetic-0".into(),
            label: "test pattern".into(),
        }
    }

    fn annotation_reply(envelope: &WireEnvelope) -> Option<WireEnvelope> {
        if envelope.event != EVENT_FRAME {
            return None;
        }
        Some(WireEnvelope::new(
            EVENT_BOUNDING_BOX,
            json!({
                "x": 10, "y": 20, "w": 30, "h": 40,
                "colorRectangle": [255, 0, 0],
                "orientation": "front",
                "text4User": "person",
                "textFacDis": "1.5 m"
            }),
        ))
    }

    async fn wait_connected(handle: &ChannelHandle) {
        let mut rx = handle.state_changes();
        timeout(Duration::from_secs(1), async {
            while *rx.borrow() != ConnectionState::Connected {
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("never connected");
    }

    /// End-to-end: SyntheticCamera -> CaptureScheduler -> channel ->
    /// loopback annotation -> Correlator -> BufferDisplay
    #[tokio::test]
    async fn test_e2e_annotation_loop() {
        let transport = MockTransport::new();
        transport.set_reply(annotation_reply);

        let manager = ChannelManager::spawn(transport.clone(), ChannelOptions::default());
        let handle = manager.handle();

        let camera = SyntheticCamera::acquire(&small_prefs()).unwrap();
        let metadata = camera.metadata();

        let (pace, pace_rx) = PaceController::new(30);
        let slot = Arc::new(SendSlot::new());
        let display = Arc::new(BufferDisplay::new());

        let correlator = Arc::new(Correlator::new(
            Arc::clone(&slot),
            pace,
            Arc::clone(&display) as Arc<dyn contracts::DisplaySink>,
            metadata,
            32,
            24,
        ));
        correlator.attach(&handle);

        handle.connect();
        wait_connected(&handle).await;

        let scheduler = CaptureScheduler::start(
            Arc::new(camera),
            FrameEncoder::new(32, 40),
            handle.clone(),
            pace_rx,
            Arc::clone(&slot),
        );

        sleep(Duration::from_millis(300)).await;
        let frames_sent = scheduler.frames_sent();
        scheduler.shutdown().await;

        assert!(frames_sent >= 3, "sent only {frames_sent} frames");
        assert!(correlator.results_received() >= 3);
        assert!(!display.is_empty());

        let update = display.last().unwrap();
        assert_eq!(update.geometry_line, "x: 10, y: 20, width: 30, height: 40");
        assert_eq!(update.orientation, "front");
        assert!(update.latency_line.starts_with("Last="));

        // Low loopback latency keeps the full frame rate
        assert_eq!(correlator.current_fps(), 30);

        drop(handle);
        manager.shutdown().await;
    }

    /// Slow results have to drag the frame rate down; fast ones restore it
    #[tokio::test]
    async fn test_e2e_rate_adaptation() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), ChannelOptions::default());
        let handle = manager.handle();

        let (pace, mut pace_rx) = PaceController::new(30);
        let slot = Arc::new(SendSlot::new());
        let display = Arc::new(BufferDisplay::new());
        let correlator = Arc::new(Correlator::new(
            Arc::clone(&slot),
            pace,
            Arc::clone(&display) as Arc<dyn contracts::DisplaySink>,
            SyntheticCamera::acquire(&small_prefs()).unwrap().metadata(),
            32,
            24,
        ));
        correlator.attach(&handle);

        handle.connect();
        wait_connected(&handle).await;

        let result = json!({
            "x": 0, "y": 0, "w": 8, "h": 8,
            "colorRectangle": [0, 0, 255]
        });

        // Two slow round trips: stamp, dawdle, then deliver the result
        for _ in 0..2 {
            slot.stamp(std::time::Instant::now());
            sleep(Duration::from_millis(120)).await;
            transport.inject(WireEnvelope::new(EVENT_BOUNDING_BOX, result.clone()));
            sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(correlator.current_fps(), 15);
        assert_eq!(*pace_rx.borrow_and_update(), Duration::from_millis(66));

        drop(handle);
        manager.shutdown().await;
    }

    /// A dropped connection must heal without restarting the capture loop
    #[tokio::test]
    async fn test_e2e_survives_connection_drop() {
        let transport = MockTransport::new();
        let options = ChannelOptions {
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(20),
        };
        let manager = ChannelManager::spawn(transport.clone(), options);
        let handle = manager.handle();

        let camera = SyntheticCamera::acquire(&small_prefs()).unwrap();
        let (_pace_tx, pace_rx) = watch::channel(Duration::from_millis(10));
        let slot = Arc::new(SendSlot::new());

        handle.connect();
        wait_connected(&handle).await;

        let scheduler = CaptureScheduler::start(
            Arc::new(camera),
            FrameEncoder::new(32, 40),
            handle.clone(),
            pace_rx,
            slot,
        );

        sleep(Duration::from_millis(80)).await;
        let before_drop = transport.sent_count();
        assert!(before_drop > 0);

        transport.drop_connection();
        sleep(Duration::from_millis(200)).await;

        assert_eq!(transport.connect_attempts(), 2);
        assert!(
            transport.sent_count() > before_drop,
            "no frames sent after reconnect"
        );

        scheduler.shutdown().await;
        drop(handle);
        manager.shutdown().await;
    }

    /// After giving up, a fresh connect request starts a new attempt cycle
    #[tokio::test]
    async fn test_e2e_manual_reconnect_after_giving_up() {
        let transport = MockTransport::failing(3);
        let options = ChannelOptions {
            max_reconnect_attempts: 2,
            reconnect_delay: Duration::from_millis(20),
        };
        let manager = ChannelManager::spawn(transport.clone(), options);
        let handle = manager.handle();

        handle.connect();
        // Initial attempt plus two retries all fail
        sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.connect_attempts(), 3);
        assert_eq!(handle.state(), ConnectionState::Disconnected);

        // Transport has recovered by now; a new request succeeds
        handle.connect();
        wait_connected(&handle).await;
        assert_eq!(transport.connect_attempts(), 4);

        drop(handle);
        manager.shutdown().await;
    }

    /// Shutdown tears everything down promptly, in order
    #[tokio::test]
    async fn test_e2e_teardown() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport, ChannelOptions::default());
        let handle = manager.handle();

        let camera = SyntheticCamera::acquire(&small_prefs()).unwrap();
        let (_pace_tx, pace_rx) = watch::channel(Duration::from_millis(10));

        handle.connect();
        wait_connected(&handle).await;

        let scheduler = CaptureScheduler::start(
            Arc::new(camera),
            FrameEncoder::new(32, 40),
            handle.clone(),
            pace_rx,
            Arc::new(SendSlot::new()),
        );

        timeout(Duration::from_secs(1), scheduler.shutdown())
            .await
            .expect("capture loop did not stop");

        drop(handle);
        timeout(Duration::from_secs(1), manager.shutdown())
            .await
            .expect("channel supervisor did not stop");
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_defaults_match_service_expectations() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[channel]
endpoint = "ws://127.0.0.1:5000/stream"

[camera]
width = 1920
height = 1080
frame_rate = 30.0
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(blueprint.channel.max_reconnect_attempts, 5);
        assert_eq!(blueprint.channel.reconnect_delay_ms, 2000);
        assert_eq!(blueprint.capture.target_width, 330);
        assert_eq!(blueprint.capture.jpeg_quality, 40);
        assert_eq!(blueprint.capture.initial_fps, 30);
    }
}

mod common;

#[cfg(test)]
mod stream_tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::common::{init_tracing, Script, ScriptedCodec};

    use codec_engine::compression::{CodecError, CodecKind, Direction};
    use codec_engine::config::EngineConfig;
    use codec_engine::engine::{CodecStream, Dispatcher, EventSink, StreamEvent};
    use codec_engine::types::EngineError;

    type Events = Arc<Mutex<Vec<StreamEvent>>>;

    fn sink(events: &Events) -> EventSink {
        let events = events.clone();
        Box::new(move |event| events.lock().push(event))
    }

    fn data_of(events: &Events) -> Vec<u8> {
        events
            .lock()
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Data(b) => Some(b.to_vec()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn dispatcher() -> Dispatcher {
        init_tracing();
        Dispatcher::init(EngineConfig::default().with_workers(2)).unwrap()
    }

    #[test]
    fn compress_stream_emits_data_then_end() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let stream = CodecStream::open(&d, CodecKind::Zstd, Direction::Compress, None, sink(&events)).unwrap();

        assert!(stream.write("aaaa"));
        assert!(stream.write("bbbb"));
        assert!(stream.end());
        assert!(!stream.write("too late"));
        assert!(!stream.end());
        d.run_until_idle();

        assert_eq!(events.lock().last(), Some(&StreamEvent::End));
        assert!(!stream.is_readable());
        let compressed = data_of(&events);

        let restored: Events = Arc::default();
        let inflate = CodecStream::open(&d, CodecKind::Zstd, Direction::Decompress, None, sink(&restored)).unwrap();
        inflate.write(compressed);
        inflate.end();
        d.run_until_idle();

        assert_eq!(data_of(&restored), b"aaaabbbb");
        assert_eq!(restored.lock().last(), Some(&StreamEvent::End));
    }

    #[test]
    fn empty_chunks_are_not_emitted() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let (codec, _) = ScriptedCodec::identity();
        let stream = CodecStream::new(&d, d.open_session(codec).unwrap(), sink(&events));

        stream.write("");
        stream.write("x");
        stream.end();
        d.run_until_idle();

        let events = events.lock();
        assert_eq!(*events, vec![StreamEvent::Data("x".into()), StreamEvent::End]);
    }

    #[test]
    fn paused_stream_holds_events_until_resume() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let (codec, _) = ScriptedCodec::identity();
        let stream = CodecStream::new(&d, d.open_session(codec).unwrap(), sink(&events));

        stream.pause();
        assert!(stream.is_paused());
        stream.write("one");
        stream.write("two");
        stream.end();
        d.run_until_idle();
        assert!(events.lock().is_empty());

        stream.resume();
        assert_eq!(
            *events.lock(),
            vec![StreamEvent::Data("one".into()), StreamEvent::Data("two".into()), StreamEvent::End]
        );
    }

    #[test]
    fn first_error_ends_the_stream() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let stream = CodecStream::open(&d, CodecKind::Deflate, Direction::Decompress, None, sink(&events)).unwrap();

        stream.write(vec![0xffu8; 32]);
        stream.write(vec![0xffu8; 32]);
        d.run_until_idle();

        {
            let events = events.lock();
            assert_eq!(events.len(), 1, "only the first failure is reported");
            assert!(matches!(
                events[0],
                StreamEvent::Error(EngineError::Codec(CodecError::ProcessFailed { .. }))
            ));
        }
        assert!(!stream.is_readable());
        assert!(!stream.is_writeable());
        assert!(!stream.write("more"));
    }

    #[test]
    fn close_fault_is_an_error_event() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let (codec, _) = ScriptedCodec::boxed(Script { fail_finish: true, ..Script::default() });
        let stream = CodecStream::new(&d, d.open_session(codec).unwrap(), sink(&events));

        stream.write("abc");
        stream.end();
        d.run_until_idle();

        let events = events.lock();
        assert_eq!(events[0], StreamEvent::Data("abc".into()));
        assert!(matches!(events[1], StreamEvent::Error(_)));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn destroy_drops_pending_events() {
        let d = dispatcher();
        let events: Events = Arc::default();
        let (codec, calls) = ScriptedCodec::identity();
        let stream = CodecStream::new(&d, d.open_session(codec).unwrap(), sink(&events));

        stream.write("lost");
        stream.destroy();
        assert!(!stream.is_writeable());
        assert!(!stream.write("after"));
        d.run_until_idle();

        assert!(events.lock().is_empty());
        assert_eq!(calls.destroy(), 1);
    }
}

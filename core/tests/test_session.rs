mod common;

#[cfg(test)]
mod session_tests {
    use super::common::{Script, ScriptedCodec};

    use codec_engine::buffer::GrowableBuffer;
    use codec_engine::compression::CodecError;
    use codec_engine::config::{EngineConfig, SizingPolicy};
    use codec_engine::engine::{CodecSession, Job, JobKind, Status};
    use codec_engine::state::{Operation, State};
    use codec_engine::types::EngineError;

    fn open(script: Script) -> (CodecSession, std::sync::Arc<super::common::Calls>) {
        let (codec, calls) = ScriptedCodec::boxed(script);
        let mut session = CodecSession::new(codec);
        session.init().unwrap();
        (session, calls)
    }

    #[test]
    fn init_moves_idle_to_data() {
        let (codec, calls) = ScriptedCodec::identity();
        let mut session = CodecSession::new(codec);
        assert_eq!(session.state(), State::Idle);

        session.init().unwrap();
        assert_eq!(session.state(), State::Data);
        assert_eq!(calls.init(), 1);
    }

    #[test]
    fn init_twice_is_a_sequence_error() {
        let (mut session, calls) = open(Script::default());
        let err = session.init().unwrap_err();
        assert_eq!(err, EngineError::Sequence { op: Operation::Init, state: State::Data });
        assert_eq!(session.state(), State::Data);
        assert_eq!(calls.init(), 1);
    }

    #[test]
    fn failed_init_leaves_error_and_destroy_still_works() {
        let (codec, calls) = ScriptedCodec::boxed(Script { fail_init: true, ..Script::default() });
        let mut session = CodecSession::new(codec);

        let err = session.init().unwrap_err();
        assert!(matches!(err, EngineError::Codec(CodecError::InitFailed { .. })));
        assert_eq!(session.state(), State::Error);

        session.destroy();
        assert_eq!(session.state(), State::Destroyed);
        assert_eq!(calls.destroy(), 1);
    }

    #[test]
    fn write_before_init_is_rejected() {
        let (codec, calls) = ScriptedCodec::identity();
        let mut session = CodecSession::new(codec);
        let mut out = GrowableBuffer::new();

        let err = session.write(b"data", &mut out).unwrap_err();
        assert_eq!(err, EngineError::Sequence { op: Operation::Write, state: State::Idle });
        assert!(out.is_empty());
        assert_eq!(calls.write(), 0);
    }

    #[test]
    fn write_copies_through_codec() {
        let (mut session, _) = open(Script::default());
        let mut out = GrowableBuffer::new();

        assert_eq!(session.write(b"hello ", &mut out), Ok(Status::Ok));
        assert_eq!(session.write(b"world", &mut out), Ok(Status::Ok));
        assert_eq!(out.as_slice(), b"hello world");
        assert_eq!(session.state(), State::Data);
    }

    #[test]
    fn partial_consumption_is_retried_until_input_is_used() {
        let (mut session, calls) = open(Script { max_consume: Some(1), ..Script::default() });
        let mut out = GrowableBuffer::new();

        session.write(b"abcd", &mut out).unwrap();
        assert_eq!(out.as_slice(), b"abcd");
        assert_eq!(calls.write(), 4);
    }

    #[test]
    fn piecewise_consumption_keeps_capacity_linear() {
        let (mut session, calls) = open(Script { max_consume: Some(1), ..Script::default() });
        let input = vec![7u8; 256];
        let mut out = GrowableBuffer::new();

        assert_eq!(session.write(&input, &mut out), Ok(Status::Ok));
        assert_eq!(out.as_slice(), &input[..]);
        assert_eq!(calls.write(), 256);
        assert!(
            out.capacity() <= 2 * (input.len() + 1),
            "capacity {} should stay proportional to the input",
            out.capacity()
        );
    }

    #[test]
    fn chunked_sizing_grows_only_when_window_is_short() {
        let (codec, _) = ScriptedCodec::boxed(Script { max_consume: Some(1), ..Script::default() });
        let config = EngineConfig::single_threaded().with_sizing(SizingPolicy::Chunked { chunk: 16 });
        let mut session = CodecSession::with_config(codec, &config);
        session.init().unwrap();

        let input = vec![1u8; 200];
        let mut out = GrowableBuffer::new();
        session.write(&input, &mut out).unwrap();
        assert_eq!(out.len(), 200);
        assert!(out.capacity() <= 2 * (input.len() + 16), "capacity {}", out.capacity());
    }

    #[test]
    fn chunked_sizing_loops_while_window_is_full() {
        let (codec, _) = ScriptedCodec::identity();
        let config = EngineConfig::single_threaded().with_sizing(SizingPolicy::Chunked { chunk: 3 });
        let mut session = CodecSession::with_config(codec, &config);
        session.init().unwrap();

        let input: Vec<u8> = (0..100u8).collect();
        let mut out = GrowableBuffer::new();
        session.write(&input, &mut out).unwrap();
        assert_eq!(out.as_slice(), &input[..]);
    }

    #[test]
    fn stalled_codec_is_a_codec_fault() {
        let (mut session, _) = open(Script { max_consume: Some(0), ..Script::default() });
        let mut out = GrowableBuffer::new();

        let err = session.write(b"xyz", &mut out).unwrap_err();
        assert!(matches!(err, EngineError::Codec(CodecError::Stalled { .. })));
        assert_eq!(session.state(), State::Error);
    }

    #[test]
    fn end_of_stream_discards_rest_and_later_writes_skip_codec() {
        let (mut session, calls) = open(Script { eos_after: Some(4), ..Script::default() });
        let mut out = GrowableBuffer::new();

        assert_eq!(session.write(b"abcdefgh", &mut out), Ok(Status::EndOfStream));
        assert_eq!(out.as_slice(), b"abcd");
        assert_eq!(session.state(), State::Eos);

        let writes = calls.write();
        let mut more = GrowableBuffer::new();
        assert_eq!(session.write(b"ignored", &mut more), Ok(Status::EndOfStream));
        assert!(more.is_empty());
        assert_eq!(calls.write(), writes, "codec must not be invoked after end of stream");
    }

    #[test]
    fn write_fault_moves_to_error_then_close_releases() {
        let (mut session, calls) = open(Script { fail_write_on_call: Some(2), ..Script::default() });
        let mut out = GrowableBuffer::new();

        session.write(b"ok", &mut out).unwrap();
        let err = session.write(b"bad", &mut out).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(session.state(), State::Error);

        let err = session.write(b"after", &mut out).unwrap_err();
        assert_eq!(err, EngineError::Sequence { op: Operation::Write, state: State::Error });

        let mut tail = GrowableBuffer::new();
        assert_eq!(session.close(&mut tail), Ok(Status::Ok));
        assert!(tail.is_empty());
        assert_eq!(calls.finish(), 0, "no flush from the error state");
        assert_eq!(calls.destroy(), 1);
        assert_eq!(session.state(), State::Destroyed);
    }

    #[test]
    fn close_drains_in_fixed_chunks() {
        let trailer: Vec<u8> = (0..300u32).map(|i| (i % 256) as u8).collect();
        let (codec, calls) = ScriptedCodec::boxed(Script { trailer: trailer.clone(), ..Script::default() });
        let config = EngineConfig::single_threaded().with_finish_chunk(128);
        let mut session = CodecSession::with_config(codec, &config);
        session.init().unwrap();

        let mut out = GrowableBuffer::new();
        assert_eq!(session.close(&mut out), Ok(Status::Ok));
        assert_eq!(out.as_slice(), &trailer[..]);
        assert!(calls.finish() >= 2);
        assert_eq!(calls.destroy(), 1);
        assert_eq!(session.state(), State::Destroyed);
    }

    #[test]
    fn close_twice_is_a_noop_success() {
        let (mut session, calls) = open(Script::default());
        let mut out = GrowableBuffer::new();

        session.close(&mut out).unwrap();
        assert_eq!(session.state(), State::Destroyed);

        let mut again = GrowableBuffer::new();
        assert_eq!(session.close(&mut again), Ok(Status::Ok));
        assert!(again.is_empty());
        assert_eq!(calls.destroy(), 1);
    }

    #[test]
    fn close_surfaces_flush_fault_but_still_destroys() {
        let (mut session, calls) = open(Script { fail_finish: true, ..Script::default() });
        let mut out = GrowableBuffer::new();

        let err = session.close(&mut out).unwrap_err();
        assert!(matches!(err, EngineError::Codec(CodecError::ProcessFailed { .. })));
        assert_eq!(session.state(), State::Destroyed);
        assert_eq!(calls.destroy(), 1);
    }

    #[test]
    fn destroy_on_fresh_session_never_touches_codec() {
        let (codec, calls) = ScriptedCodec::identity();
        let mut session = CodecSession::new(codec);

        session.destroy();
        session.destroy();
        assert_eq!(session.state(), State::Destroyed);
        assert_eq!(calls.destroy(), 0);
    }

    #[test]
    fn dropping_an_open_session_destroys_codec() {
        let (session, calls) = open(Script::default());
        drop(session);
        assert_eq!(calls.destroy(), 1);
    }

    #[test]
    fn execute_dispatches_on_job_kind() {
        let (mut session, _) = open(Script { trailer: b"!".to_vec(), ..Script::default() });

        let mut write = Job::new(JobKind::Write("abc".into()), None);
        assert_eq!(session.execute(&mut write), Ok(Status::Ok));
        assert_eq!(write.output.as_slice(), b"abc");

        let mut close = Job::new(JobKind::Close, None);
        assert_eq!(session.execute(&mut close), Ok(Status::Ok));
        assert_eq!(close.output.as_slice(), b"!");

        let mut write_after = Job::new(JobKind::Write("late".into()), None);
        let err = session.execute(&mut write_after).unwrap_err();
        assert_eq!(err, EngineError::Sequence { op: Operation::Write, state: State::Destroyed });
        assert!(write_after.output.is_empty());
    }
}

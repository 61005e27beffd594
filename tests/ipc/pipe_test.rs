/*!
 * Pipe Tests
 * Blocking pipe channels through the system call interface
 */

use super::common::{eventually, kernel_with, run};
use coop_kernel::fd::FdError;
use coop_kernel::ipc::pipe::{table, PipeOwner, PipeTable};
use coop_kernel::{ErrorKind, KernelConfig, PipeError, SyscallContext, SyscallError};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_pipe_write_read() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        assert_eq!(ctx.write(pipe.write, b"Hello through pipe!").unwrap(), 19);

        let mut buf = [0u8; 19];
        assert_eq!(ctx.read(pipe.read, &mut buf).unwrap(), 19);
        assert_eq!(&buf, b"Hello through pipe!");
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_reader_drains_then_sees_eof() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        ctx.write(pipe.write, b"tail").unwrap();
        ctx.close(pipe.write).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(ctx.read(pipe.read, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"tail");
        assert_eq!(ctx.read(pipe.read, &mut buf).unwrap(), 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_blocked_reader_wakes_on_writer_close() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let reader = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let mut buf = [0u8; 8];
                    ctx.read(pipe.read, &mut buf).unwrap() as i32
                },
                Vec::new(),
            )
            .unwrap();

        assert!(eventually(|| ctx.thread_info(reader).is_ok_and(|t| !t.exited)));
        ctx.close(pipe.write).unwrap();
        ctx.thread_join(reader).unwrap()
    });
    assert_eq!(status, 0);
}

#[test]
fn test_pipe_connects_parent_and_child() {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);

    let status = run(move |ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let child = ctx
            .exec(
                move |ctx: &SyscallContext, greeting: Vec<u8>| {
                    ctx.close(pipe.read).unwrap();
                    ctx.write(pipe.write, &greeting).unwrap();
                    0
                },
                b"from the child".to_vec(),
            )
            .unwrap();
        ctx.close(pipe.write).unwrap();

        // EOF arrives once the child's inherited write end is closed too
        let mut buf = [0u8; 64];
        let n = ctx.read(pipe.read, &mut buf).unwrap();
        sink.lock().extend_from_slice(&buf[..n]);

        assert_eq!(ctx.wait_child(Some(child)).unwrap(), (child, 0));
        0
    });

    assert_eq!(status, 0);
    assert_eq!(collected.lock().as_slice(), b"from the child");
}

#[test]
fn test_writer_blocks_at_capacity() {
    let kernel = kernel_with(KernelConfig::default().with_pipe_buffer_size(8));

    let status = kernel
        .boot(
            |ctx: &SyscallContext, _| {
                let pipe = ctx.pipe().unwrap();
                assert_eq!(ctx.pipe_stats(pipe.read).unwrap().capacity, 7);

                let writer = ctx
                    .create_thread(
                        move |ctx: &SyscallContext, _| ctx.write(pipe.write, &[9u8; 10]).unwrap() as i32,
                        Vec::new(),
                    )
                    .unwrap();

                // the writer fills the ring and parks with three bytes left
                assert!(eventually(|| ctx.pipe_stats(pipe.read).unwrap().buffered == 7));
                assert!(!ctx.thread_info(writer).unwrap().exited);

                let mut buf = [0u8; 10];
                assert_eq!(ctx.read(pipe.read, &mut buf).unwrap(), 10);
                assert_eq!(buf, [9u8; 10]);
                assert_eq!(ctx.thread_join(writer).unwrap(), 10);
                0
            },
            Vec::new(),
        )
        .unwrap();
    assert_eq!(status, 0);
}

#[test]
fn test_write_after_reader_closed_is_broken_pipe() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        ctx.close(pipe.read).unwrap();

        let err = ctx.write(pipe.write, b"nobody listens").unwrap_err();
        assert_eq!(err, SyscallError::Pipe(PipeError::BrokenPipe));
        assert_eq!(err.kind(), ErrorKind::PeerGone);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_wrong_direction_is_invalid_argument() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let mut buf = [0u8; 1];

        let err = ctx.read(pipe.write, &mut buf).unwrap_err();
        assert_eq!(err, SyscallError::Descriptor(FdError::NotReadable(pipe.write)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = ctx.write(pipe.read, b"x").unwrap_err();
        assert_eq!(err, SyscallError::Descriptor(FdError::NotWritable(pipe.read)));

        ctx.close(pipe.read).unwrap();
        let err = ctx.close(pipe.read).unwrap_err();
        assert_eq!(err, SyscallError::Descriptor(FdError::InvalidFid(pipe.read)));
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_pipe_released_once_both_ends_close() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        assert_eq!(ctx.kernel().stats().pipes, 1);

        ctx.close(pipe.write).unwrap();
        assert_eq!(ctx.kernel().stats().pipes, 1);
        ctx.close(pipe.read).unwrap();
        assert_eq!(ctx.kernel().stats().pipes, 0);
        assert_eq!(ctx.kernel().stats().files, 0);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_descriptor_exhaustion_is_not_fatal() {
    let kernel = kernel_with(KernelConfig::default().with_max_fileid(3));

    let status = kernel
        .boot(
            |ctx: &SyscallContext, _| {
                ctx.pipe().unwrap();
                let err = ctx.pipe().unwrap_err();
                assert_eq!(
                    err,
                    SyscallError::Descriptor(FdError::TableFull {
                        requested: 2,
                        available: 1
                    })
                );
                assert_eq!(err.kind(), ErrorKind::ResourceExhausted);

                // all or nothing: the free slot is still there
                assert!(ctx.socket(0).is_ok());
                0
            },
            Vec::new(),
        )
        .unwrap();
    assert_eq!(status, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_bytes_arrive_in_order_regardless_of_chunking(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..32),
        read_sizes in prop::collection::vec(1usize..48, 1..16),
    ) {
        let pipes = Mutex::new(PipeTable::new(4096));
        let id = pipes.lock().create(PipeOwner::File(1), PipeOwner::File(2));
        let mut guard = pipes.lock();

        let expected: Vec<u8> = chunks.concat();
        for chunk in &chunks {
            prop_assert_eq!(table::write(&mut guard, id, chunk).unwrap(), chunk.len());
        }
        guard.close_writer(id).unwrap();

        let mut received = Vec::new();
        for size in read_sizes.iter().cycle() {
            let mut buf = vec![0u8; *size];
            let n = table::read(&mut guard, id, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(received, expected);
    }
}

/*!
 * Thread Tests
 * create/join/detach/exit semantics inside one process
 */

use super::common::{eventually, run};
use coop_kernel::{ErrorKind, SyscallContext, SyscallError, ThreadError};
use pretty_assertions::assert_eq;

#[test]
fn test_join_returns_exit_value() {
    let status = run(|ctx: &SyscallContext, _| {
        let worker = ctx
            .create_thread(|_: &SyscallContext, args| args.len() as i32, vec![0; 42])
            .unwrap();
        assert_eq!(ctx.thread_join(worker).unwrap(), 42);

        // reclaimed by the join
        assert_eq!(
            ctx.thread_join(worker).unwrap_err(),
            SyscallError::Thread(ThreadError::InvalidTid(worker))
        );
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_thread_exit_never_returns() {
    let status = run(|ctx: &SyscallContext, _| {
        let worker = ctx
            .create_thread(
                |ctx: &SyscallContext, _| {
                    ctx.thread_exit(7);
                },
                Vec::new(),
            )
            .unwrap();
        assert_eq!(ctx.thread_join(worker).unwrap(), 7);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_thread_self_cannot_be_joined() {
    let status = run(|ctx: &SyscallContext, _| {
        let me = ctx.thread_self();
        let err = ctx.thread_join(me).unwrap_err();
        assert_eq!(err, SyscallError::Thread(ThreadError::SelfJoin(me)));
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_unknown_tid_is_invalid() {
    let status = run(|ctx: &SyscallContext, _| {
        let err = ctx.thread_detach(9999).unwrap_err();
        assert_eq!(err, SyscallError::Thread(ThreadError::InvalidTid(9999)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_detached_thread_cannot_be_joined() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let worker = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let mut buf = [0u8; 1];
                    ctx.read(pipe.read, &mut buf).unwrap() as i32
                },
                Vec::new(),
            )
            .unwrap();

        ctx.thread_detach(worker).unwrap();
        assert_eq!(
            ctx.thread_join(worker).unwrap_err(),
            SyscallError::Thread(ThreadError::Detached(worker))
        );

        // once it exits, a detached thread is reclaimed on the spot
        ctx.write(pipe.write, b"x").unwrap();
        assert!(eventually(|| ctx.thread_info(worker).is_err()));
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_detach_wakes_pending_joiner() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let sleeper = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let mut buf = [0u8; 1];
                    ctx.read(pipe.read, &mut buf).unwrap() as i32
                },
                Vec::new(),
            )
            .unwrap();
        let joiner = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| match ctx.thread_join(sleeper) {
                    Err(SyscallError::Thread(ThreadError::Detached(tid))) if tid == sleeper => 0,
                    _ => 1,
                },
                Vec::new(),
            )
            .unwrap();

        assert!(eventually(|| ctx.thread_info(sleeper).unwrap().joiners == 1));
        ctx.thread_detach(sleeper).unwrap();
        assert_eq!(ctx.thread_join(joiner).unwrap(), 0);

        ctx.write(pipe.write, b"x").unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_exited_thread_cannot_be_detached_but_can_be_joined() {
    let status = run(|ctx: &SyscallContext, _| {
        let worker = ctx.create_thread(|_: &SyscallContext, _| 5, Vec::new()).unwrap();
        assert!(eventually(|| ctx.thread_info(worker).unwrap().exited));

        assert_eq!(
            ctx.thread_detach(worker).unwrap_err(),
            SyscallError::Thread(ThreadError::AlreadyExited(worker))
        );
        assert_eq!(ctx.thread_join(worker).unwrap(), 5);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_every_waiting_joiner_sees_the_exit_value() {
    let status = run(|ctx: &SyscallContext, _| {
        let pipe = ctx.pipe().unwrap();
        let target = ctx
            .create_thread(
                move |ctx: &SyscallContext, _| {
                    let mut buf = [0u8; 1];
                    ctx.read(pipe.read, &mut buf).unwrap();
                    11
                },
                Vec::new(),
            )
            .unwrap();

        let joiners: Vec<_> = (0..3)
            .map(|_| {
                ctx.create_thread(
                    move |ctx: &SyscallContext, _| ctx.thread_join(target).unwrap_or(-1),
                    Vec::new(),
                )
                .unwrap()
            })
            .collect();

        assert!(eventually(|| ctx.thread_info(target).unwrap().joiners == 3));
        ctx.write(pipe.write, b"x").unwrap();

        for joiner in joiners {
            assert_eq!(ctx.thread_join(joiner).unwrap(), 11);
        }
        // the last joiner out reclaimed it
        assert!(ctx.thread_info(target).is_err());
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn test_panicking_task_exits_with_minus_one() {
    let status = run(|ctx: &SyscallContext, _| {
        let worker = ctx
            .create_thread(|_: &SyscallContext, _| panic!("task failure"), Vec::new())
            .unwrap();
        assert_eq!(ctx.thread_join(worker).unwrap(), -1);
        0
    });
    assert_eq!(status, 0);
}

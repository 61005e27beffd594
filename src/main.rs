/*!
 * Cooperative Kernel - Main Entry Point
 *
 * Boots a kernel whose init process runs an echo demo over the loopback
 * socket rendezvous, then prints the final process table as JSON.
 */

use coop_kernel::{
    init_tracing, Fid, Kernel, KernelConfig, Port, ShutdownMode, SyscallContext, SyscallResult,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

const ECHO_PORT: Port = 7;

fn main() -> ExitCode {
    init_tracing();

    let config = match KernelConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid kernel configuration");
            return ExitCode::FAILURE;
        }
    };
    let kernel = match Kernel::builder().with_config(config).build() {
        Ok(kernel) => kernel,
        Err(e) => {
            error!(error = %e, "failed to build kernel");
            return ExitCode::FAILURE;
        }
    };

    info!("booting kernel");
    match kernel.boot(init, Vec::new()) {
        Ok(0) => {
            info!(stats = ?kernel.stats(), "kernel halted");
            ExitCode::SUCCESS
        }
        Ok(code) => {
            error!(code, "init exited with failure");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "boot failed");
            ExitCode::FAILURE
        }
    }
}

fn init(ctx: &SyscallContext, _args: Vec<u8>) -> i32 {
    match run_demo(ctx) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, kind = %e.kind(), "echo demo failed");
            1
        }
    }
}

fn run_demo(ctx: &SyscallContext) -> SyscallResult<()> {
    let listener = ctx.socket(ECHO_PORT)?;
    ctx.listen(listener)?;

    let server = ctx.create_thread(move |ctx: &SyscallContext, _| echo_once(ctx, listener), Vec::new())?;

    let client = ctx.exec(
        |ctx: &SyscallContext, message: Vec<u8>| match echo_client(ctx, &message) {
            Ok(()) => 0,
            Err(e) => {
                error!(error = %e, "echo client failed");
                2
            }
        },
        b"hello over the loopback".to_vec(),
    )?;

    let served = ctx.thread_join(server)?;
    let (pid, status) = ctx.wait_child(Some(client))?;
    info!(pid, status, served, "echo client finished");

    match serde_json::to_string_pretty(&ctx.process_info()) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "cannot render process table"),
    }
    ctx.close(listener)
}

/// Serve one connection: echo bytes back until the client shuts down its side
fn echo_once(ctx: &SyscallContext, listener: Fid) -> i32 {
    let served = (|| -> SyscallResult<usize> {
        let peer = ctx.accept(listener)?;
        let mut total = 0;
        let mut buf = [0u8; 64];
        loop {
            let n = ctx.read(peer, &mut buf)?;
            if n == 0 {
                break;
            }
            ctx.write(peer, &buf[..n])?;
            total += n;
        }
        ctx.close(peer)?;
        Ok(total)
    })();
    match served {
        Ok(total) => total as i32,
        Err(e) => {
            error!(error = %e, "echo server failed");
            -1
        }
    }
}

fn echo_client(ctx: &SyscallContext, message: &[u8]) -> SyscallResult<()> {
    let sock = ctx.socket(0)?;
    ctx.connect(sock, ECHO_PORT, Some(Duration::from_secs(5)))?;
    ctx.write(sock, message)?;
    ctx.shutdown(sock, ShutdownMode::Write)?;

    let mut echoed = vec![0u8; message.len()];
    let n = ctx.read(sock, &mut echoed)?;
    info!(echoed = %String::from_utf8_lossy(&echoed[..n]), "client received echo");
    ctx.close(sock)
}

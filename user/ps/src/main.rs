//! Hosted `ps` runner.
//!
//! Boots the introspection core in-process, builds the demo process tree
//! and runs `ps` as one of its processes.
//!
//! Environment:
//!   NEST_PS_AS   process to run as: `init` (default), `sh` or `ps`
//!   NEST_LOG     kernel log level: trace, debug, info, warn (default), error

use std::env;
use std::process::ExitCode;

use nestos_kernel::config::KernelConfig;
use ps::hosted::{Demo, HostedSys};

/// Kernel log output goes to stderr.
struct Stderr;

impl klog::Sink for Stderr {
    fn write_str(&self, s: &str) {
        eprint!("{}", s);
    }
}

static STDERR: Stderr = Stderr;

fn log_level() -> klog::Level {
    match env::var("NEST_LOG").as_deref() {
        Ok("trace") => klog::Level::Trace,
        Ok("debug") => klog::Level::Debug,
        Ok("info") => klog::Level::Info,
        Ok("error") => klog::Level::Error,
        _ => klog::Level::Warn,
    }
}

fn main() -> ExitCode {
    klog::init(&STDERR, log_level());

    let kernel = nestos_kernel::init(KernelConfig::new().with_first_pid(10));
    let demo = match Demo::populate(kernel) {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("ps: demo setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let name = env::var("NEST_PS_AS").unwrap_or_else(|_| String::from("init"));
    let Some(caller) = demo.find(&name) else {
        let known: Vec<&str> = demo.names().collect();
        eprintln!("ps: NEST_PS_AS={} is not one of {}", name, known.join(", "));
        return ExitCode::FAILURE;
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let mut sys = HostedSys::new(kernel, caller);
    let (mut out, mut err) = (String::new(), String::new());
    let code = ps::run(&mut sys, &args, &mut out, &mut err);
    print!("{}", out);
    eprint!("{}", err);

    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

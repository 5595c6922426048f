//! `ps` end to end: client logic, syscall dispatch and the kernel services.

use nestos_kernel::Kernel;
use nestos_kernel::config::{IntrospectFlags, KernelConfig};
use ps::hosted::{Demo, HostedSys};

fn ps_as<R: nestos_kernel::task::IdentityResolver>(
    kernel: &Kernel<R>,
    demo: &Demo,
    who: &str,
    args: &[&str],
) -> (i32, String, String) {
    let caller = demo.find(who).unwrap();
    let mut sys = HostedSys::new(kernel, caller);
    let (mut out, mut err) = (String::new(), String::new());
    let code = ps::run(&mut sys, args, &mut out, &mut err);
    assert!(kernel.procs.is_quiescent());
    (code, out, err)
}

fn demo_kernel(flags: IntrospectFlags) -> Kernel {
    Kernel::new(KernelConfig::new().with_first_pid(10).with_flags(flags))
}

#[test]
fn visibility_follows_the_namespace_chain() {
    let kernel = demo_kernel(IntrospectFlags::empty());
    let demo = Demo::populate(&kernel).unwrap();

    assert_eq!(ps_as(&kernel, &demo, "ps", &["pids"]).1, "12\n");
    assert_eq!(ps_as(&kernel, &demo, "sh", &["pids"]).1, "11\n12\n");
    assert_eq!(ps_as(&kernel, &demo, "init", &["pids"]).1, "10\n11\n12\n");
    assert_eq!(ps_as(&kernel, &demo, "init", &["count"]).1, "3\n");
    assert_eq!(ps_as(&kernel, &demo, "ps", &["count"]).1, "1\n");
}

#[test]
fn list_from_the_outermost_namespace() {
    let kernel = demo_kernel(IntrospectFlags::empty());
    let demo = Demo::populate(&kernel).unwrap();

    let (code, out, err) = ps_as(&kernel, &demo, "init", &["list"]);
    assert_eq!(code, 0, "{err}");
    assert_eq!(
        out,
        "pid\tstate\t\tppid\tnmspc\tgpid\tgppid\tname\n\
         10\tSLEEPING\t0\t0\t1\t0\tinit\n\
         11\tSLEEPING\t10\t1\t1\t1\tsh\n\
         12\tRUNNING \t11\t2\t1\t1\tps\n"
    );
}

#[test]
fn own_ids_are_namespace_relative() {
    let kernel = demo_kernel(IntrospectFlags::empty());
    let demo = Demo::populate(&kernel).unwrap();

    assert_eq!(ps_as(&kernel, &demo, "init", &["ppid"]).1, "parent pid: 0\n");
    assert_eq!(ps_as(&kernel, &demo, "sh", &["ppid"]).1, "parent pid: 1\n");
    assert_eq!(ps_as(&kernel, &demo, "ps", &["pid"]).1, "pid: 1\n");
}

#[test]
fn growth_loop_sees_every_process() {
    let kernel = demo_kernel(IntrospectFlags::empty());
    let demo = Demo::populate(&kernel).unwrap();
    let init = demo.find("init").unwrap();
    let ns = kernel.procs.lock(init.handle()).unwrap().ns();
    for _ in 0..7 {
        kernel
            .procs
            .spawn(&kernel.namespaces, "worker", ns, Some(init.handle()))
            .unwrap();
    }

    let (code, out, _) = ps_as(&kernel, &demo, "init", &["pids"]);
    assert_eq!(code, 0);
    let pids: Vec<i32> = out.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(pids, (10..20).collect::<Vec<_>>());
}

#[test]
fn hidden_foreign_parents_show_as_zero() {
    let kernel = demo_kernel(IntrospectFlags::HIDE_FOREIGN_PARENTS);
    let demo = Demo::populate(&kernel).unwrap();

    let (_, out, _) = ps_as(&kernel, &demo, "ps", &["list"]);
    assert_eq!(out.lines().nth(1), Some("12\tRUNNING \t0\t2\t1\t0\tps"));
}

#[test]
fn usage_errors_exit_nonzero() {
    let kernel = demo_kernel(IntrospectFlags::empty());
    let demo = Demo::populate(&kernel).unwrap();

    let (code, out, err) = ps_as(&kernel, &demo, "init", &["clone"]);
    assert_ne!(code, 0);
    assert_eq!(out, "");
    assert!(err.starts_with("ps: unknown argument: clone\n"));
    assert!(err.ends_with(&format!("{}\n", ps::USAGE)));
}

//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: i32) {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn try_lock_memory() -> eyre::Result<()> {
        use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
        let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            eyre::bail!(
                "mlockall(current|future) failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
            );
        }
        Ok(())
    }

    fn try_apply_fifo_priority(prio: i32) -> eyre::Result<()> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = sched_param {
            sched_priority: prio.clamp(min, max),
        };
        let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            eyre::bail!(
                "SCHED_FIFO failed: {}; hint: needs CAP_SYS_NICE or root",
                std::io::Error::last_os_error()
            );
        }
        Ok(())
    }

    RT_ONCE.get_or_init(|| {
        match try_lock_memory() {
            Ok(()) => tracing::info!("memory locked"),
            Err(e) => tracing::warn!(error = %e, "continuing without locked memory"),
        }
        match try_apply_fifo_priority(prio) {
            Ok(()) => tracing::info!(prio, "SCHED_FIFO enabled"),
            Err(e) => tracing::warn!(error = %e, "continuing with default scheduling"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: i32) {
    if rt {
        tracing::warn!("real-time mode is only supported on Linux; ignoring --rt");
    }
}

//! Background system metrics.
//!
//! A [`SamplerHandle`] thread reads CPU, memory, temperature and disk usage
//! each cycle. A field whose read fails keeps its last known value. The
//! finished [`MetricsSnapshot`] goes into a single-slot cell; its lock is
//! taken only after all reads are done, never across I/O, and the reader
//! clears the changed flag as it takes the value.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use sysinfo::Components;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Point-in-time readout shown in the stats bar.
///
/// `cpu` stays `None` until two counter samples exist, since a single
/// sample has no baseline to derive utilization from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cpu: Option<u8>,
    pub mem: u8,
    pub temp: i32,
    pub disk: u8,
}

/// Cumulative CPU time counters from the first line of `/proc/stat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Physical memory counters, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryCounters {
    pub total: u64,
    pub free: u64,
    pub buffers: u64,
}

/// Filesystem block counts for one mount point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskBlocks {
    pub total: u64,
    pub available: u64,
}

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected contents in {}", path.display())]
    Parse { path: PathBuf },

    #[error("{0} is not available on this platform")]
    Unsupported(&'static str),

    #[error("{call} failed: {source}")]
    Syscall {
        call: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// ─── DERIVED VALUES ─────────────────────────────────────────────

/// `100 − 100·Δidle/Δtotal`, or `None` when the counters did not advance
/// (or went backwards).
pub fn cpu_percent(prev: CpuTimes, cur: CpuTimes) -> Option<u8> {
    let d_total = cur.total.checked_sub(prev.total)?;
    let d_idle = cur.idle.checked_sub(prev.idle)?;
    if d_total == 0 {
        return None;
    }
    let idle_pct = (100 * d_idle.min(d_total)) / d_total;
    Some((100 - idle_pct) as u8)
}

/// `100·(total − (free + buffers))/total`. Page cache counts as used.
pub fn memory_percent(m: MemoryCounters) -> Option<u8> {
    if m.total == 0 {
        return None;
    }
    let avail = m.free.saturating_add(m.buffers).min(m.total);
    Some(((100 * (m.total - avail) as u128) / m.total as u128) as u8)
}

pub fn disk_percent(d: DiskBlocks) -> Option<u8> {
    if d.total == 0 {
        return None;
    }
    let avail = d.available.min(d.total);
    Some(((100 * (d.total - avail) as u128) / d.total as u128) as u8)
}

/// Parse the aggregate `cpu` line: `cpu user nice system idle iowait irq softirq ...`.
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = fields.take(7).map(|f| f.parse().ok()).collect::<Option<_>>()?;
    let [user, nice, system, idle, iowait, irq, softirq] = values[..] else {
        return None;
    };
    Some(CpuTimes {
        idle: idle + iowait,
        total: user + nice + system + idle + iowait + irq + softirq,
    })
}

// ─── SOURCES ────────────────────────────────────────────────────

/// Raw metric sources. Each read is independent; there is no consistency
/// guarantee across the four.
pub trait MetricSource: Send {
    fn cpu_times(&mut self) -> Result<CpuTimes, MetricError>;
    fn memory(&mut self) -> Result<MemoryCounters, MetricError>;
    fn temperature_millis(&mut self) -> Result<i64, MetricError>;
    fn disk_blocks(&mut self) -> Result<DiskBlocks, MetricError>;
}

enum ThermalSource {
    Zone(PathBuf),
    /// Used when the configured sensor file is unreadable at startup.
    Components(Components),
}

/// Reads the live system: procfs for CPU and temperature, `sysinfo(2)` for
/// memory and `statvfs(3)` for the disk.
pub struct SystemSource {
    stat_path: PathBuf,
    thermal: ThermalSource,
    mount: PathBuf,
}

impl SystemSource {
    pub fn new(thermal_sensor: &Path, mount: &Path) -> Self {
        let thermal = if std::fs::read_to_string(thermal_sensor).is_ok() {
            ThermalSource::Zone(thermal_sensor.to_path_buf())
        } else {
            let components = Components::new_with_refreshed_list();
            if components.iter().next().is_some() {
                warn!(
                    sensor = %thermal_sensor.display(),
                    "thermal sensor unreadable, falling back to the first hardware component"
                );
                ThermalSource::Components(components)
            } else {
                ThermalSource::Zone(thermal_sensor.to_path_buf())
            }
        };
        Self {
            stat_path: PathBuf::from("/proc/stat"),
            thermal,
            mount: mount.to_path_buf(),
        }
    }
}

fn read_file(path: &Path) -> Result<String, MetricError> {
    std::fs::read_to_string(path).map_err(|source| MetricError::Read { path: path.to_path_buf(), source })
}

impl MetricSource for SystemSource {
    fn cpu_times(&mut self) -> Result<CpuTimes, MetricError> {
        let stat = read_file(&self.stat_path)?;
        parse_cpu_times(&stat).ok_or_else(|| MetricError::Parse { path: self.stat_path.clone() })
    }

    fn memory(&mut self) -> Result<MemoryCounters, MetricError> {
        read_memory()
    }

    fn temperature_millis(&mut self) -> Result<i64, MetricError> {
        match &mut self.thermal {
            ThermalSource::Zone(path) => {
                let raw = read_file(path)?;
                raw.trim().parse().map_err(|_| MetricError::Parse { path: path.clone() })
            }
            ThermalSource::Components(components) => {
                components.refresh();
                components
                    .iter()
                    .next()
                    .map(|c| (c.temperature() * 1000.0) as i64)
                    .ok_or(MetricError::Unsupported("hardware temperature sensor"))
            }
        }
    }

    fn disk_blocks(&mut self) -> Result<DiskBlocks, MetricError> {
        read_disk_blocks(&self.mount)
    }
}

#[cfg(target_os = "linux")]
fn read_memory() -> Result<MemoryCounters, MetricError> {
    // SAFETY: sysinfo only writes into the zeroed struct we hand it.
    let mut si: libc::sysinfo = unsafe { std::mem::zeroed() };
    if unsafe { libc::sysinfo(&mut si) } != 0 {
        return Err(MetricError::Syscall { call: "sysinfo", source: std::io::Error::last_os_error() });
    }
    let unit = si.mem_unit.max(1) as u64;
    Ok(MemoryCounters {
        total: si.totalram as u64 * unit,
        free: si.freeram as u64 * unit,
        buffers: si.bufferram as u64 * unit,
    })
}

#[cfg(not(target_os = "linux"))]
fn read_memory() -> Result<MemoryCounters, MetricError> {
    Err(MetricError::Unsupported("sysinfo(2)"))
}

#[cfg(unix)]
fn read_disk_blocks(mount: &Path) -> Result<DiskBlocks, MetricError> {
    use std::os::unix::ffi::OsStrExt;
    let c_path = std::ffi::CString::new(mount.as_os_str().as_bytes())
        .map_err(|_| MetricError::Parse { path: mount.to_path_buf() })?;
    // SAFETY: `c_path` is NUL-terminated and `sv` is a zeroed out-parameter
    // owned by this frame.
    let mut sv: libc::statvfs = unsafe { std::mem::zeroed() };
    if unsafe { libc::statvfs(c_path.as_ptr(), &mut sv) } != 0 {
        return Err(MetricError::Syscall { call: "statvfs", source: std::io::Error::last_os_error() });
    }
    Ok(DiskBlocks { total: sv.f_blocks as u64, available: sv.f_bavail as u64 })
}

#[cfg(not(unix))]
fn read_disk_blocks(_mount: &Path) -> Result<DiskBlocks, MetricError> {
    Err(MetricError::Unsupported("statvfs(3)"))
}

// ─── SAMPLER ────────────────────────────────────────────────────

/// Turns raw source reads into snapshots. A failed read keeps the field at
/// its last known value.
pub struct Sampler<P> {
    source: P,
    cpu_baseline: Option<CpuTimes>,
    current: MetricsSnapshot,
}

impl<P: MetricSource> Sampler<P> {
    pub fn new(source: P) -> Self {
        Self { source, cpu_baseline: None, current: MetricsSnapshot::default() }
    }

    pub fn sample(&mut self) -> MetricsSnapshot {
        match self.source.cpu_times() {
            Ok(now) => {
                if let Some(pct) = self.cpu_baseline.and_then(|prev| cpu_percent(prev, now)) {
                    self.current.cpu = Some(pct);
                }
                self.cpu_baseline = Some(now);
            }
            Err(e) => debug!("cpu sample skipped: {e}"),
        }

        match self.source.memory().map(memory_percent) {
            Ok(Some(pct)) => self.current.mem = pct,
            Ok(None) => debug!("memory sample skipped: zero total"),
            Err(e) => debug!("memory sample skipped: {e}"),
        }

        match self.source.temperature_millis() {
            Ok(milli) => self.current.temp = (milli / 1000) as i32,
            Err(e) => debug!("temperature sample skipped: {e}"),
        }

        match self.source.disk_blocks().map(disk_percent) {
            Ok(Some(pct)) => self.current.disk = pct,
            Ok(None) => debug!("disk sample skipped: zero blocks"),
            Err(e) => debug!("disk sample skipped: {e}"),
        }

        self.current
    }
}

// ─── SNAPSHOT HAND-OFF ──────────────────────────────────────────

#[derive(Default)]
struct Slot {
    latest: MetricsSnapshot,
    changed: bool,
}

/// Create the single-slot cell shared by the sampler thread and the UI loop.
/// Latest value wins; the writer half is not cloneable.
pub fn snapshot_slot() -> (SnapshotWriter, SnapshotReader) {
    let slot = Arc::new(Mutex::new(Slot::default()));
    (SnapshotWriter { slot: Arc::clone(&slot) }, SnapshotReader { slot })
}

pub struct SnapshotWriter {
    slot: Arc<Mutex<Slot>>,
}

impl SnapshotWriter {
    /// Store `snapshot`, raising the change flag only if it differs from
    /// what is already published. Returns whether it differed.
    pub fn publish(&self, snapshot: MetricsSnapshot) -> bool {
        let mut slot = self.slot.lock();
        if slot.latest == snapshot {
            return false;
        }
        slot.latest = snapshot;
        slot.changed = true;
        true
    }
}

#[derive(Clone)]
pub struct SnapshotReader {
    slot: Arc<Mutex<Slot>>,
}

impl SnapshotReader {
    /// Read-and-clear: yields the snapshot once per published change.
    pub fn take_changed(&self) -> Option<MetricsSnapshot> {
        let mut slot = self.slot.lock();
        if !slot.changed {
            return None;
        }
        slot.changed = false;
        Some(slot.latest)
    }

    pub fn latest(&self) -> MetricsSnapshot {
        self.slot.lock().latest
    }
}

// ─── SAMPLER THREAD ─────────────────────────────────────────────

/// Owns the background sampling thread. Stopping (or dropping) signals the
/// thread and joins it, so no writer outlives the handle.
pub struct SamplerHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn spawn<P>(source: P, interval: Duration, writer: SnapshotWriter) -> std::io::Result<Self>
    where
        P: MetricSource + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = std::thread::Builder::new()
            .name("metrics-sampler".into())
            .spawn(move || {
                let mut sampler = Sampler::new(source);
                loop {
                    // The lock is only taken inside publish, after all reads.
                    let snapshot = sampler.sample();
                    writer.publish(snapshot);
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("metrics sampler stopped");
            })?;
        info!(?interval, "metrics sampler started");
        Ok(Self { stop: Some(stop_tx), thread: Some(thread) })
    }

    /// Signal the thread and wait for it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("metrics sampler thread panicked");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Scripted source: each read pops the next queued result, failing once
    /// the queue is empty.
    #[derive(Default)]
    struct FakeSource {
        cpu: VecDeque<CpuTimes>,
        mem: VecDeque<MemoryCounters>,
        temp: VecDeque<i64>,
        disk: VecDeque<DiskBlocks>,
    }

    fn missing() -> MetricError {
        MetricError::Read {
            path: PathBuf::from("/fake"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    impl MetricSource for FakeSource {
        fn cpu_times(&mut self) -> Result<CpuTimes, MetricError> {
            self.cpu.pop_front().ok_or_else(missing)
        }
        fn memory(&mut self) -> Result<MemoryCounters, MetricError> {
            self.mem.pop_front().ok_or_else(missing)
        }
        fn temperature_millis(&mut self) -> Result<i64, MetricError> {
            self.temp.pop_front().ok_or_else(missing)
        }
        fn disk_blocks(&mut self) -> Result<DiskBlocks, MetricError> {
            self.disk.pop_front().ok_or_else(missing)
        }
    }

    fn cpu(idle: u64, total: u64) -> CpuTimes {
        CpuTimes { idle, total }
    }

    #[test]
    fn test_parse_proc_stat() {
        let stat = "cpu  10 2 8 70 5 3 2 0 0 0\ncpu0 1 1 1 1 1 1 1 0 0 0\n";
        assert_eq!(parse_cpu_times(stat), Some(cpu(75, 100)));
        assert_eq!(parse_cpu_times("intr 1 2 3"), None);
        assert_eq!(parse_cpu_times("cpu 1 2 3"), None);
        assert_eq!(parse_cpu_times(""), None);
    }

    #[test]
    fn test_cpu_percent() {
        assert_eq!(cpu_percent(cpu(0, 0), cpu(75, 100)), Some(25));
        assert_eq!(cpu_percent(cpu(50, 100), cpu(50, 100)), None);
        assert_eq!(cpu_percent(cpu(50, 100), cpu(40, 90)), None);
    }

    #[test]
    fn test_memory_excludes_buffers_but_not_cache() {
        let m = MemoryCounters { total: 1000, free: 200, buffers: 100 };
        assert_eq!(memory_percent(m), Some(70));
        assert_eq!(memory_percent(MemoryCounters { total: 0, free: 0, buffers: 0 }), None);
    }

    #[test]
    fn test_disk_percent() {
        assert_eq!(disk_percent(DiskBlocks { total: 400, available: 100 }), Some(75));
        assert_eq!(disk_percent(DiskBlocks { total: 0, available: 0 }), None);
    }

    #[test]
    fn test_first_sample_has_no_cpu() {
        let mut source = FakeSource::default();
        source.cpu.extend([cpu(100, 1000), cpu(150, 1100)]);
        let mut sampler = Sampler::new(source);
        assert_eq!(sampler.sample().cpu, None);
        assert_eq!(sampler.sample().cpu, Some(50));
    }

    #[test]
    fn test_failed_reads_keep_last_known_values() {
        let mut source = FakeSource::default();
        source.cpu.extend([cpu(0, 0), cpu(10, 100)]);
        source.mem.push_back(MemoryCounters { total: 100, free: 40, buffers: 10 });
        source.temp.push_back(48_750);
        source.disk.push_back(DiskBlocks { total: 10, available: 5 });
        let mut sampler = Sampler::new(source);

        sampler.sample();
        let second = sampler.sample();
        assert_eq!(second, MetricsSnapshot { cpu: Some(90), mem: 50, temp: 48, disk: 50 });

        // Every source now fails; nothing moves.
        assert_eq!(sampler.sample(), second);
    }

    #[test]
    fn test_change_flag_is_read_and_clear() {
        let (writer, reader) = snapshot_slot();
        let at = |c| MetricsSnapshot { cpu: Some(c), ..Default::default() };

        assert!(writer.publish(at(10)));
        assert_eq!(reader.take_changed(), Some(at(10)));

        // Same value again, then a real transition: exactly one signal.
        assert!(!writer.publish(at(10)));
        assert_eq!(reader.take_changed(), None);
        assert!(writer.publish(at(20)));
        assert_eq!(reader.take_changed(), Some(at(20)));
        assert_eq!(reader.take_changed(), None);
    }

    #[test]
    fn test_unobserved_changes_coalesce() {
        let (writer, reader) = snapshot_slot();
        writer.publish(MetricsSnapshot { mem: 10, ..Default::default() });
        writer.publish(MetricsSnapshot { mem: 20, ..Default::default() });
        assert_eq!(reader.take_changed().map(|s| s.mem), Some(20));
        assert_eq!(reader.take_changed(), None);
        assert_eq!(reader.latest().mem, 20);
    }

    #[test]
    fn test_sampler_thread_publishes_and_stops() {
        let mut source = FakeSource::default();
        source.mem.push_back(MemoryCounters { total: 100, free: 25, buffers: 0 });
        let (writer, reader) = snapshot_slot();
        let mut handle = SamplerHandle::spawn(source, Duration::from_millis(10), writer).unwrap();

        let mut seen = None;
        for _ in 0..200 {
            if let Some(s) = reader.take_changed() {
                seen = Some(s);
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(seen.map(|s| s.mem), Some(75));

        handle.stop();
        assert!(handle.thread.is_none());
        handle.stop();
    }

    proptest! {
        #[test]
        fn prop_cpu_percent_bounded(
            idle0 in 0u64..1_000_000, total0 in 0u64..1_000_000,
            d_idle in 0u64..1_000_000, d_total in 0u64..1_000_000,
        ) {
            let prev = cpu(idle0, total0);
            let cur = cpu(idle0 + d_idle, total0 + d_total);
            if let Some(pct) = cpu_percent(prev, cur) {
                prop_assert!(pct <= 100);
            }
        }
    }
}

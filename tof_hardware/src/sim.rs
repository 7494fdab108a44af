//! Simulated bus and sensor backends.
//!
//! `RegisterMapBus` behaves like a single register-addressed device: writes
//! store bytes at consecutive register addresses, reads return them. It keeps
//! a transaction log and can inject failures. `SimulatedTof` stands in for a
//! whole ranging driver when no hardware is attached.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tof_traits::{BoxError, I2cBus, RangingDriver, RangingResult};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    Write { address: u8, bytes: Vec<u8> },
    WriteRead { address: u8, out: Vec<u8>, len: usize },
}

#[derive(Debug, Default)]
struct MapState {
    registers: BTreeMap<u16, u8>,
    log: Vec<BusOp>,
    init_calls: usize,
    fail_next: usize,
    short_next: usize,
}

/// In-memory register map. Clones share the same device.
#[derive(Debug, Clone)]
pub struct RegisterMapBus {
    address: u8,
    state: Arc<Mutex<MapState>>,
}

impl RegisterMapBus {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(MapState::default())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut MapState) -> R) -> R {
        // A poisoned lock only happens after a panicking test; keep the data.
        let mut st = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut st)
    }

    /// Preload a register without logging a transaction.
    pub fn set(&self, reg: u16, value: u8) {
        self.with(|st| st.registers.insert(reg, value));
    }

    pub fn set_be(&self, reg: u16, bytes: &[u8]) {
        self.with(|st| {
            for (i, b) in bytes.iter().enumerate() {
                st.registers.insert(reg.wrapping_add(i as u16), *b);
            }
        });
    }

    pub fn get(&self, reg: u16) -> u8 {
        self.with(|st| st.registers.get(&reg).copied().unwrap_or(0))
    }

    pub fn log(&self) -> Vec<BusOp> {
        self.with(|st| st.log.clone())
    }

    pub fn clear_log(&self) {
        self.with(|st| st.log.clear());
    }

    pub fn transaction_count(&self) -> usize {
        self.with(|st| st.log.len())
    }

    pub fn init_calls(&self) -> usize {
        self.with(|st| st.init_calls)
    }

    /// Make the next `n` transfers return a bus error.
    pub fn fail_next(&self, n: usize) {
        self.with(|st| st.fail_next = n);
    }

    /// Make the next `n` transfers move one byte less than requested.
    pub fn short_transfers(&self, n: usize) {
        self.with(|st| st.short_next = n);
    }
}

/// Outcome of the fault-injection check for one transfer.
enum Fault {
    None,
    Error,
    Short,
}

impl MapState {
    fn take_fault(&mut self) -> Fault {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            Fault::Error
        } else if self.short_next > 0 {
            self.short_next -= 1;
            Fault::Short
        } else {
            Fault::None
        }
    }
}

impl I2cBus for RegisterMapBus {
    fn init(&mut self) -> Result<(), BoxError> {
        self.with(|st| st.init_calls += 1);
        Ok(())
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError> {
        let own = self.address;
        self.with(|st| -> Result<usize, BoxError> {
            st.log.push(BusOp::Write {
                address,
                bytes: bytes.to_vec(),
            });
            match st.take_fault() {
                Fault::Error => return Err("simulated NACK".into()),
                Fault::Short => return Ok(bytes.len().saturating_sub(1)),
                Fault::None => {}
            }
            if address != own {
                return Err(format!("no device at 0x{address:02X}").into());
            }
            if let [hi, lo, payload @ ..] = bytes {
                let reg = u16::from_be_bytes([*hi, *lo]);
                for (i, b) in payload.iter().enumerate() {
                    st.registers.insert(reg.wrapping_add(i as u16), *b);
                }
            }
            Ok(bytes.len())
        })
    }

    fn write_read(
        &mut self,
        address: u8,
        out: &[u8],
        input: &mut [u8],
    ) -> Result<usize, BoxError> {
        let own = self.address;
        self.with(|st| -> Result<usize, BoxError> {
            st.log.push(BusOp::WriteRead {
                address,
                out: out.to_vec(),
                len: input.len(),
            });
            let n = match st.take_fault() {
                Fault::Error => return Err("simulated NACK".into()),
                Fault::Short => input.len().saturating_sub(1),
                Fault::None => input.len(),
            };
            if address != own {
                return Err(format!("no device at 0x{address:02X}").into());
            }
            let reg = match out {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                _ => return Err("register address must be two bytes".into()),
            };
            for (i, slot) in input.iter_mut().take(n).enumerate() {
                *slot = st
                    .registers
                    .get(&reg.wrapping_add(i as u16))
                    .copied()
                    .unwrap_or(0);
            }
            Ok(n)
        })
    }
}

/// Shape of the simulated distance trace.
#[derive(Debug, Clone)]
pub struct SimProfile {
    /// Centre of the triangle sweep (mm).
    pub base_mm: u16,
    /// Peak-to-centre amplitude of the sweep (mm).
    pub sweep_mm: u16,
    /// Samples per sweep half-period.
    pub half_period: u32,
    /// Every n-th sample is an outlier spike; 0 disables spikes.
    pub spike_every: u32,
    pub spike_mm: u16,
}

impl Default for SimProfile {
    fn default() -> Self {
        Self {
            base_mm: 400,
            sweep_mm: 150,
            half_period: 40,
            spike_every: 7,
            spike_mm: 2000,
        }
    }
}

/// Simulated time-of-flight sensor. Every call counts as one bus access so
/// tests can verify that a halted controller stays silent.
#[derive(Debug)]
pub struct SimulatedTof {
    profile: SimProfile,
    sample: u32,
    ranging: bool,
    fail_init: bool,
    fail_fetch_at: Vec<u32>,
    calls: Arc<Mutex<usize>>,
}

impl SimulatedTof {
    pub fn new(profile: SimProfile) -> Self {
        Self {
            profile,
            sample: 0,
            ranging: false,
            fail_init: false,
            fail_fetch_at: Vec::new(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// `sensor_init` reports failure.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// `get_result` fails for the given 0-based fetch index.
    pub fn failing_fetch_at(mut self, index: u32) -> Self {
        self.fail_fetch_at.push(index);
        self
    }

    /// Shared counter of driver calls (stand-in for bus transactions).
    pub fn call_counter(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }

    fn touch(&self) {
        if let Ok(mut n) = self.calls.lock() {
            *n += 1;
        }
    }

    fn distance_at(&self, i: u32) -> u16 {
        let p = &self.profile;
        if p.spike_every > 0 && i % p.spike_every == p.spike_every - 1 {
            return p.spike_mm;
        }
        let half = p.half_period.max(1);
        let phase = i % (2 * half);
        let ramp = if phase < half { phase } else { 2 * half - phase };
        // ramp in [0, half] -> offset in [-sweep, +sweep]
        let offset =
            (i64::from(ramp) * 2 * i64::from(p.sweep_mm)) / i64::from(half) - i64::from(p.sweep_mm);
        (i64::from(p.base_mm) + offset).clamp(0, i64::from(u16::MAX)) as u16
    }
}

impl Default for SimulatedTof {
    fn default() -> Self {
        Self::new(SimProfile::default())
    }
}

impl RangingDriver for SimulatedTof {
    fn init_bus(&mut self) -> Result<(), BoxError> {
        self.touch();
        Ok(())
    }

    fn sensor_init(&mut self) -> Result<(), BoxError> {
        self.touch();
        if self.fail_init {
            return Err("sensor did not boot (simulated)".into());
        }
        Ok(())
    }

    fn set_range_timing(&mut self, timing_budget_ms: u32, inter_ms: u32) -> Result<(), BoxError> {
        self.touch();
        debug!(timing_budget_ms, inter_ms, "simulated range timing");
        Ok(())
    }

    fn start_ranging(&mut self) -> Result<(), BoxError> {
        self.touch();
        self.ranging = true;
        Ok(())
    }

    fn check_data_ready(&mut self) -> Result<bool, BoxError> {
        self.touch();
        Ok(self.ranging)
    }

    fn get_result(&mut self) -> Result<RangingResult, BoxError> {
        self.touch();
        let i = self.sample;
        self.sample = self.sample.wrapping_add(1);
        if self.fail_fetch_at.contains(&i) {
            return Err(Box::new(crate::error::HwError::Transfer));
        }
        Ok(RangingResult {
            data_ready: true,
            range_status: 0,
            distance_mm: self.distance_at(i),
            sigma_mm: 2,
            signal_kcps: 4096,
            ambient_kcps: 64,
        })
    }

    fn clear_interrupt(&mut self) -> Result<(), BoxError> {
        self.touch();
        Ok(())
    }
}

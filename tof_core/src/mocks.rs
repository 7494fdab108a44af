//! Test and helper mocks for tof_core.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tof_traits::{BoxError, RangingDriver, RangingResult};

/// Shared record of driver calls, in order.
#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn push(&self, call: &'static str) {
        if let Ok(mut v) = self.0.lock() {
            v.push(call);
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.0.lock().map(|v| v.len()).unwrap_or(0)
    }
}

/// One scripted polling period.
#[derive(Debug, Clone)]
pub enum Step {
    NotReady,
    Distance(u16),
    ReadyCheckFails,
    FetchFails,
}

/// A ranging driver that replays a fixed script of polling periods. Once the
/// script is exhausted the sensor reports "not ready" forever.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    script: VecDeque<Step>,
    pending: Option<Step>,
    fail_stage: Option<&'static str>,
    log: CallLog,
}

impl ScriptedDriver {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Each distance becomes one ready period.
    pub fn distances(values: impl IntoIterator<Item = u16>) -> Self {
        Self::new(values.into_iter().map(Step::Distance))
    }

    /// Make the named bring-up call fail: `init_bus`, `sensor_init`,
    /// `set_range_timing` or `start_ranging`.
    pub fn failing_at(mut self, stage: &'static str) -> Self {
        self.fail_stage = Some(stage);
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    fn enter(&self, call: &'static str) -> Result<(), BoxError> {
        self.log.push(call);
        if self.fail_stage == Some(call) {
            return Err(format!("{call} rejected (scripted)").into());
        }
        Ok(())
    }
}

impl RangingDriver for ScriptedDriver {
    fn init_bus(&mut self) -> Result<(), BoxError> {
        self.enter("init_bus")
    }

    fn sensor_init(&mut self) -> Result<(), BoxError> {
        self.enter("sensor_init")
    }

    fn set_range_timing(&mut self, _budget_ms: u32, _inter_ms: u32) -> Result<(), BoxError> {
        self.enter("set_range_timing")
    }

    fn start_ranging(&mut self) -> Result<(), BoxError> {
        self.enter("start_ranging")
    }

    fn check_data_ready(&mut self) -> Result<bool, BoxError> {
        self.enter("check_data_ready")?;
        match self.script.pop_front().unwrap_or(Step::NotReady) {
            Step::NotReady => Ok(false),
            Step::ReadyCheckFails => Err("data-ready read failed (scripted)".into()),
            step => {
                self.pending = Some(step);
                Ok(true)
            }
        }
    }

    fn get_result(&mut self) -> Result<RangingResult, BoxError> {
        self.enter("get_result")?;
        match self.pending.take() {
            Some(Step::Distance(mm)) => Ok(RangingResult {
                data_ready: true,
                distance_mm: mm,
                ..RangingResult::default()
            }),
            _ => Err("result read failed (scripted)".into()),
        }
    }

    fn clear_interrupt(&mut self) -> Result<(), BoxError> {
        self.enter("clear_interrupt")
    }
}

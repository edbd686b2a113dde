//! Default Error Tracer (DET)
//!
//! Every driver reports precondition and argument failures through the
//! [`Det`] trait instead of returning Rust errors. The integrator supplies
//! the sink; two are provided here:
//!
//! - [`DefmtDet`] logs every report (when the `defmt` feature is enabled)
//!   and counts them.
//! - [`RecordingDet`] keeps the reports in memory so host tests and
//!   integrations can inspect them.

use core::cell::RefCell;

use heapless::Vec;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::types::StdReturn;

/// Module id of the DET itself
pub const DET_MODULE_ID: u16 = 15;

/// Classification of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    /// Development error (wrong usage of an API)
    Development,
    /// Runtime error detected by the hardware or driver
    Runtime,
    /// Transient fault that may disappear on retry
    Transient,
}

/// A single error report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetReport {
    pub module_id: u16,
    pub instance_id: u8,
    pub api_id: u8,
    pub error_id: u8,
    pub kind: ReportKind,
}

/// DET configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetConfig {
    /// Forward development errors to the output
    pub log_development_errors: bool,
    /// Forward runtime errors and transient faults to the output
    pub log_runtime_errors: bool,
}

impl Default for DetConfig {
    fn default() -> Self {
        Self {
            log_development_errors: true,
            log_runtime_errors: true,
        }
    }
}

/// Error report sink
///
/// All methods take `&self` and must be callable from interrupt context.
pub trait Det {
    /// Apply the configuration
    fn init(&self, _config: &DetConfig) {}

    /// One-shot initialization of the backing output
    fn start(&self) {}

    /// Report a development error
    fn report_error(&self, module_id: u16, instance_id: u8, api_id: u8, error_id: u8)
        -> StdReturn;

    /// Report a runtime error
    fn report_runtime_error(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        error_id: u8,
    ) -> StdReturn;

    /// Report a transient fault
    fn report_transient_fault(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        fault_id: u8,
    ) -> StdReturn;
}

/// DET sink that logs through defmt
pub struct DefmtDet {
    started: AtomicBool,
    log_development: AtomicBool,
    log_runtime: AtomicBool,
    reports: AtomicU32,
}

impl Default for DefmtDet {
    fn default() -> Self {
        Self::new()
    }
}

impl DefmtDet {
    /// Create a sink with the default configuration
    pub const fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            log_development: AtomicBool::new(true),
            log_runtime: AtomicBool::new(true),
            reports: AtomicU32::new(0),
        }
    }

    /// Number of reports received so far, of any kind
    pub fn report_count(&self) -> u32 {
        self.reports.load(Ordering::Relaxed)
    }

    /// Check if `start` has been called
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Relaxed)
    }

    fn record(&self, report: DetReport) {
        self.reports.fetch_add(1, Ordering::Relaxed);

        let enabled = match report.kind {
            ReportKind::Development => self.log_development.load(Ordering::Relaxed),
            ReportKind::Runtime | ReportKind::Transient => self.log_runtime.load(Ordering::Relaxed),
        };
        if !enabled {
            return;
        }

        #[cfg(feature = "defmt")]
        match report.kind {
            ReportKind::Development => defmt::error!(
                "DET: module {} instance {} api {=u8:#x} error {=u8:#x}",
                report.module_id,
                report.instance_id,
                report.api_id,
                report.error_id
            ),
            ReportKind::Runtime => defmt::warn!(
                "DET runtime: module {} instance {} api {=u8:#x} error {=u8:#x}",
                report.module_id,
                report.instance_id,
                report.api_id,
                report.error_id
            ),
            ReportKind::Transient => defmt::warn!(
                "DET transient: module {} instance {} api {=u8:#x} fault {=u8:#x}",
                report.module_id,
                report.instance_id,
                report.api_id,
                report.error_id
            ),
        }
    }
}

impl Det for DefmtDet {
    fn init(&self, config: &DetConfig) {
        self.log_development
            .store(config.log_development_errors, Ordering::Relaxed);
        self.log_runtime
            .store(config.log_runtime_errors, Ordering::Relaxed);
    }

    fn start(&self) {
        if !self.started.swap(true, Ordering::Relaxed) {
            #[cfg(feature = "defmt")]
            defmt::info!("DET started");
        }
    }

    fn report_error(&self, module_id: u16, instance_id: u8, api_id: u8, error_id: u8) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id,
            kind: ReportKind::Development,
        });
        Ok(())
    }

    fn report_runtime_error(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        error_id: u8,
    ) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id,
            kind: ReportKind::Runtime,
        });
        Ok(())
    }

    fn report_transient_fault(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        fault_id: u8,
    ) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id: fault_id,
            kind: ReportKind::Transient,
        });
        Ok(())
    }
}

/// DET sink that keeps the first `N` reports in memory
///
/// Not `Sync`: intended for host tests and single-context integrations.
pub struct RecordingDet<const N: usize> {
    reports: RefCell<Vec<DetReport, N>>,
    dropped: RefCell<u32>,
}

impl<const N: usize> Default for RecordingDet<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RecordingDet<N> {
    /// Create an empty recorder
    pub const fn new() -> Self {
        Self {
            reports: RefCell::new(Vec::new()),
            dropped: RefCell::new(0),
        }
    }

    /// Copy of every recorded report, oldest first
    pub fn reports(&self) -> Vec<DetReport, N> {
        self.reports.borrow().clone()
    }

    /// Most recent report
    pub fn last(&self) -> Option<DetReport> {
        self.reports.borrow().last().copied()
    }

    /// Number of recorded reports
    pub fn count(&self) -> usize {
        self.reports.borrow().len()
    }

    /// Check if nothing has been reported
    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }

    /// Reports that did not fit
    pub fn dropped(&self) -> u32 {
        *self.dropped.borrow()
    }

    /// Check if a development error with these ids was reported
    pub fn contains_error(&self, module_id: u16, api_id: u8, error_id: u8) -> bool {
        self.reports.borrow().iter().any(|r| {
            r.kind == ReportKind::Development
                && r.module_id == module_id
                && r.api_id == api_id
                && r.error_id == error_id
        })
    }

    /// Check if a runtime error with these ids was reported
    pub fn contains_runtime_error(&self, module_id: u16, api_id: u8, error_id: u8) -> bool {
        self.reports.borrow().iter().any(|r| {
            r.kind == ReportKind::Runtime
                && r.module_id == module_id
                && r.api_id == api_id
                && r.error_id == error_id
        })
    }

    /// Forget every report
    pub fn clear(&self) {
        self.reports.borrow_mut().clear();
        *self.dropped.borrow_mut() = 0;
    }

    fn record(&self, report: DetReport) -> StdReturn {
        if self.reports.borrow_mut().push(report).is_err() {
            *self.dropped.borrow_mut() += 1;
        }
        Ok(())
    }
}

impl<const N: usize> Det for RecordingDet<N> {
    fn report_error(&self, module_id: u16, instance_id: u8, api_id: u8, error_id: u8) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id,
            kind: ReportKind::Development,
        })
    }

    fn report_runtime_error(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        error_id: u8,
    ) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id,
            kind: ReportKind::Runtime,
        })
    }

    fn report_transient_fault(
        &self,
        module_id: u16,
        instance_id: u8,
        api_id: u8,
        fault_id: u8,
    ) -> StdReturn {
        self.record(DetReport {
            module_id,
            instance_id,
            api_id,
            error_id: fault_id,
            kind: ReportKind::Transient,
        })
    }
}

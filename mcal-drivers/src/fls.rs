//! FLS driver
//!
//! Jobs are latched by `erase`, `write`, `read`, `compare` and
//! `blank_check` and then processed in slices by [`Fls::main_function`],
//! which the integrator calls cyclically. Addresses are offsets from the
//! start of the managed area.
//!
//! ```text
//!   erase() ──► Busy/Pending ──► main_function() ... ──► Idle/Ok
//!                    │                                    Idle/Failed
//!                    └── cancel() ──► Idle/Canceled       Idle/BlockInconsistent
//! ```

use mcal_core::config::{FlsConfig, FlsMode, FlsStatus, JobResult};
#[cfg(feature = "version-info-api")]
use mcal_core::VersionInfo;
use mcal_core::{Det, HwUnit, NotOk, StdReturn};
use mcal_hal::{FlsArch, FlsArchError};

use crate::{report_error, report_runtime_error};

pub const MODULE_ID: u16 = 92;

/// Service ids
pub mod api {
    pub const INIT: u8 = 0x00;
    pub const ERASE: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const CANCEL: u8 = 0x03;
    pub const GET_STATUS: u8 = 0x04;
    pub const GET_JOB_RESULT: u8 = 0x05;
    pub const MAIN_FUNCTION: u8 = 0x06;
    pub const READ: u8 = 0x07;
    pub const COMPARE: u8 = 0x08;
    pub const SET_MODE: u8 = 0x09;
    pub const BLANK_CHECK: u8 = 0x0A;
    pub const GET_VERSION_INFO: u8 = 0x10;
}

/// Development and runtime error codes
pub mod error {
    pub const PARAM_CONFIG: u8 = 0x01;
    pub const PARAM_ADDRESS: u8 = 0x02;
    pub const PARAM_LENGTH: u8 = 0x03;
    pub const PARAM_DATA: u8 = 0x04;
    pub const UNINIT: u8 = 0x05;
    pub const BUSY: u8 = 0x06;
    pub const VERIFY_ERASE_FAILED: u8 = 0x07;
    pub const VERIFY_WRITE_FAILED: u8 = 0x08;
    pub const TIMEOUT: u8 = 0x09;
    pub const PARAM_POINTER: u8 = 0x0A;
    pub const ALREADY_INITIALIZED: u8 = 0x0B;
}

/// Offset from the start of the managed area
pub type FlsAddress = u32;

/// Length in bytes
pub type FlsLength = u32;

/// Main-function cycles a sector erase may stay busy
pub const ERASE_POLL_LIMIT: u32 = 1_000;

/// Bytes read back per step when verifying
const VERIFY_CHUNK: usize = 32;

/// Latched job; addresses are absolute
enum Job<'a> {
    Erase {
        next: u32,
        end: u32,
        in_flight: bool,
        polls: u32,
    },
    Write {
        address: u32,
        data: &'a [u8],
        done: usize,
    },
    Read {
        address: u32,
        buffer: &'a mut [u8],
        done: usize,
    },
    Compare {
        address: u32,
        data: &'a [u8],
        done: usize,
    },
    BlankCheck {
        address: u32,
        length: u32,
        done: u32,
    },
}

enum Progress {
    Pending,
    Finished(JobResult),
}

/// FLS driver
pub struct Fls<'a, A, D: ?Sized> {
    arch: A,
    det: &'a D,
    unit: HwUnit<'a, FlsConfig>,
    job: Option<Job<'a>>,
    job_result: JobResult,
    mode: FlsMode,
    returned: Option<&'a mut [u8]>,
}

impl<'a, A: FlsArch, D: Det + ?Sized> Fls<'a, A, D> {
    pub fn new(arch: A, det: &'a D) -> Self {
        Self {
            arch,
            det,
            unit: HwUnit::new(),
            job: None,
            job_result: JobResult::Ok,
            mode: FlsMode::Slow,
            returned: None,
        }
    }

    fn report<T>(&self, api_id: u8, error_id: u8) -> Result<T, NotOk> {
        report_error(self.det, MODULE_ID, api_id, error_id);
        Err(NotOk)
    }

    fn config(&self, api_id: u8) -> Result<&'a FlsConfig, NotOk> {
        match self.unit.config() {
            Some(config) => Ok(config),
            None => self.report(api_id, error::UNINIT),
        }
    }

    /// Check `address..address + length` and return its absolute start
    ///
    /// The start must be a multiple of `align` and so must the length.
    fn check_range(
        &self,
        api_id: u8,
        config: &FlsConfig,
        address: FlsAddress,
        length: FlsLength,
        align: u32,
    ) -> Result<u32, NotOk> {
        let total = config.total_size();
        if address >= total || address % align != 0 {
            return self.report(api_id, error::PARAM_ADDRESS);
        }
        if length == 0 || length > total - address || length % align != 0 {
            return self.report(api_id, error::PARAM_LENGTH);
        }
        Ok(config.erase_start + address)
    }

    fn check_idle(&self, api_id: u8) -> StdReturn {
        if self.job.is_some() {
            return self.report(api_id, error::BUSY);
        }
        Ok(())
    }

    fn latch(&mut self, job: Job<'a>) -> StdReturn {
        self.returned = None;
        self.job = Some(job);
        self.job_result = JobResult::Pending;
        Ok(())
    }

    /// Unlock the flash controller and apply the default mode
    pub fn init(&mut self, config: Option<&'a FlsConfig>) -> StdReturn {
        let Some(config) = config.filter(|config| config.is_valid()) else {
            return self.report(api::INIT, error::PARAM_CONFIG);
        };
        self.check_idle(api::INIT)?;
        if self.unit.init(config).is_err() {
            return self.report(api::INIT, error::ALREADY_INITIALIZED);
        }
        self.arch.init();
        self.mode = config.default_mode;
        self.job_result = JobResult::Ok;
        Ok(())
    }

    pub fn is_init(&self) -> bool {
        self.unit.is_init()
    }

    /// Erase whole sectors covering `address..address + length`
    pub fn erase(&mut self, address: FlsAddress, length: FlsLength) -> StdReturn {
        let config = self.config(api::ERASE)?;
        let start = self.check_range(api::ERASE, config, address, length, config.sector_size)?;
        self.check_idle(api::ERASE)?;
        self.latch(Job::Erase {
            next: start,
            end: start + length,
            in_flight: false,
            polls: 0,
        })
    }

    /// Program `data` at `address`; both page aligned
    pub fn write(&mut self, address: FlsAddress, data: Option<&'a [u8]>) -> StdReturn {
        let config = self.config(api::WRITE)?;
        let Some(data) = data else {
            return self.report(api::WRITE, error::PARAM_DATA);
        };
        let length = FlsLength::try_from(data.len()).unwrap_or(FlsLength::MAX);
        let start = self.check_range(api::WRITE, config, address, length, config.page_size)?;
        self.check_idle(api::WRITE)?;
        self.latch(Job::Write {
            address: start,
            data,
            done: 0,
        })
    }

    /// Fill `buffer` from `address`
    ///
    /// The buffer is handed back by [`Fls::take_buffer`] once the job ends.
    pub fn read(&mut self, address: FlsAddress, buffer: Option<&'a mut [u8]>) -> StdReturn {
        let config = self.config(api::READ)?;
        let Some(buffer) = buffer else {
            return self.report(api::READ, error::PARAM_DATA);
        };
        let length = FlsLength::try_from(buffer.len()).unwrap_or(FlsLength::MAX);
        let start = self.check_range(api::READ, config, address, length, 1)?;
        self.check_idle(api::READ)?;
        self.latch(Job::Read {
            address: start,
            buffer,
            done: 0,
        })
    }

    /// Compare flash content at `address` with `data`
    #[cfg(feature = "fls-compare-api")]
    pub fn compare(&mut self, address: FlsAddress, data: Option<&'a [u8]>) -> StdReturn {
        let config = self.config(api::COMPARE)?;
        let Some(data) = data else {
            return self.report(api::COMPARE, error::PARAM_DATA);
        };
        let length = FlsLength::try_from(data.len()).unwrap_or(FlsLength::MAX);
        let start = self.check_range(api::COMPARE, config, address, length, 1)?;
        self.check_idle(api::COMPARE)?;
        self.latch(Job::Compare {
            address: start,
            data,
            done: 0,
        })
    }

    /// Check `address..address + length` holds only erased bytes
    #[cfg(feature = "fls-blank-check-api")]
    pub fn blank_check(&mut self, address: FlsAddress, length: FlsLength) -> StdReturn {
        let config = self.config(api::BLANK_CHECK)?;
        let start = self.check_range(api::BLANK_CHECK, config, address, length, 1)?;
        self.check_idle(api::BLANK_CHECK)?;
        self.latch(Job::BlankCheck {
            address: start,
            length,
            done: 0,
        })
    }

    /// Abort the running job
    ///
    /// The result becomes `Canceled` and the error notification fires. A
    /// sector erase already started in hardware still completes.
    #[cfg(feature = "fls-cancel-api")]
    pub fn cancel(&mut self) {
        let Ok(config) = self.config(api::CANCEL) else {
            return;
        };
        if let Some(job) = self.job.take() {
            self.reclaim(job);
            self.job_result = JobResult::Canceled;
            if let Some(callback) = config.job_error_notification {
                callback();
            }
        }
    }

    #[cfg(feature = "fls-get-status-api")]
    pub fn get_status(&self) -> FlsStatus {
        if !self.unit.is_init() {
            FlsStatus::Uninit
        } else if self.job.is_some() {
            FlsStatus::Busy
        } else {
            FlsStatus::Idle
        }
    }

    #[cfg(feature = "fls-get-job-result-api")]
    pub fn get_job_result(&self) -> JobResult {
        match self.config(api::GET_JOB_RESULT) {
            Ok(_) => self.job_result,
            Err(NotOk) => JobResult::Failed,
        }
    }

    /// Select the per-cycle budgets; refused while a job runs
    #[cfg(feature = "fls-set-mode-api")]
    pub fn set_mode(&mut self, mode: FlsMode) {
        if self.config(api::SET_MODE).is_err() || self.check_idle(api::SET_MODE).is_err() {
            return;
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> FlsMode {
        self.mode
    }

    /// Buffer of the last finished or canceled read job
    pub fn take_buffer(&mut self) -> Option<&'a mut [u8]> {
        self.returned.take()
    }

    /// Process one slice of the running job
    pub fn main_function(&mut self) {
        let Ok(config) = self.config(api::MAIN_FUNCTION) else {
            return;
        };
        let Some(mut job) = self.job.take() else {
            return;
        };
        match self.step(config, &mut job) {
            Progress::Pending => self.job = Some(job),
            Progress::Finished(result) => {
                self.reclaim(job);
                self.job_result = result;
                let notification = if result == JobResult::Ok {
                    config.job_end_notification
                } else {
                    config.job_error_notification
                };
                if let Some(callback) = notification {
                    callback();
                }
            }
        }
    }

    fn reclaim(&mut self, job: Job<'a>) {
        if let Job::Read { buffer, .. } = job {
            self.returned = Some(buffer);
        }
    }

    fn step(&mut self, config: &FlsConfig, job: &mut Job<'a>) -> Progress {
        match job {
            Job::Erase {
                next,
                end,
                in_flight,
                polls,
            } => {
                if !*in_flight {
                    if self.arch.start_erase(*next).is_err() {
                        return Progress::Finished(JobResult::Failed);
                    }
                    *in_flight = true;
                    *polls = 0;
                    return Progress::Pending;
                }
                if self.arch.is_busy() {
                    *polls += 1;
                    if *polls >= ERASE_POLL_LIMIT {
                        self.runtime_error(error::TIMEOUT);
                        return Progress::Finished(JobResult::Failed);
                    }
                    return Progress::Pending;
                }
                *in_flight = false;
                if self.arch.take_error().is_some() {
                    return Progress::Finished(JobResult::Failed);
                }
                if !self.is_blank(*next, config.sector_size, config.erased_value) {
                    self.runtime_error(error::VERIFY_ERASE_FAILED);
                    return Progress::Finished(JobResult::Failed);
                }
                *next += config.sector_size;
                if *next >= *end {
                    Progress::Finished(JobResult::Ok)
                } else {
                    Progress::Pending
                }
            }
            Job::Write {
                address,
                data,
                done,
            } => {
                let budget = config.write_budget(self.mode);
                let budget = (budget - budget % config.page_size) as usize;
                let data: &'a [u8] = *data;
                let count = budget.min(data.len() - *done);
                let chunk = &data[*done..*done + count];
                let target = *address + *done as u32;
                match self.arch.program(target, chunk) {
                    Ok(()) => {}
                    Err(FlsArchError::Timeout) => {
                        self.runtime_error(error::TIMEOUT);
                        return Progress::Finished(JobResult::Failed);
                    }
                    Err(_) => return Progress::Finished(JobResult::Failed),
                }
                if !self.matches(target, chunk) {
                    self.runtime_error(error::VERIFY_WRITE_FAILED);
                    return Progress::Finished(JobResult::Failed);
                }
                *done += count;
                Self::progress(*done == data.len())
            }
            Job::Read {
                address,
                buffer,
                done,
            } => {
                let count = (config.read_budget(self.mode) as usize).min(buffer.len() - *done);
                self.arch
                    .read(*address + *done as u32, &mut buffer[*done..*done + count]);
                *done += count;
                Self::progress(*done == buffer.len())
            }
            Job::Compare {
                address,
                data,
                done,
            } => {
                let data: &'a [u8] = *data;
                let count = (config.read_budget(self.mode) as usize).min(data.len() - *done);
                if !self.matches(*address + *done as u32, &data[*done..*done + count]) {
                    return Progress::Finished(JobResult::BlockInconsistent);
                }
                *done += count;
                Self::progress(*done == data.len())
            }
            Job::BlankCheck {
                address,
                length,
                done,
            } => {
                let count = config.read_budget(self.mode).min(*length - *done);
                if !self.is_blank(*address + *done, count, config.erased_value) {
                    return Progress::Finished(JobResult::BlockInconsistent);
                }
                *done += count;
                Self::progress(*done == *length)
            }
        }
    }

    fn progress(complete: bool) -> Progress {
        if complete {
            Progress::Finished(JobResult::Ok)
        } else {
            Progress::Pending
        }
    }

    fn runtime_error(&self, error_id: u8) {
        report_runtime_error(self.det, MODULE_ID, api::MAIN_FUNCTION, error_id);
    }

    /// Whether flash at `address` holds `expected`
    fn matches(&self, mut address: u32, expected: &[u8]) -> bool {
        let mut scratch = [0u8; VERIFY_CHUNK];
        for chunk in expected.chunks(VERIFY_CHUNK) {
            let actual = &mut scratch[..chunk.len()];
            self.arch.read(address, actual);
            if actual != chunk {
                return false;
            }
            address += chunk.len() as u32;
        }
        true
    }

    /// Whether `length` bytes at `address` all read `erased`
    fn is_blank(&self, mut address: u32, length: u32, erased: u8) -> bool {
        let mut scratch = [0u8; VERIFY_CHUNK];
        let mut left = length as usize;
        while left > 0 {
            let count = left.min(VERIFY_CHUNK);
            let actual = &mut scratch[..count];
            self.arch.read(address, actual);
            if actual.iter().any(|&byte| byte != erased) {
                return false;
            }
            address += count as u32;
            left -= count;
        }
        true
    }

    #[cfg(feature = "version-info-api")]
    pub fn get_version_info(&self, out: Option<&mut VersionInfo>) {
        crate::write_version_info(
            self.det,
            MODULE_ID,
            api::GET_VERSION_INFO,
            error::PARAM_POINTER,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};
    use core::sync::atomic::{AtomicU32, Ordering};
    use mcal_core::det::RecordingDet;

    const BASE: u32 = 0x0801_F000;
    const SIZE: usize = 1024;

    /// RAM standing in for the flash array
    struct Memory {
        bytes: RefCell<[u8; SIZE]>,
        busy_polls: Cell<u32>,
        /// Value an erase leaves behind
        erased: Cell<u8>,
        /// XORed into the first byte of every programmed chunk
        corrupt: Cell<u8>,
    }

    impl Memory {
        fn new() -> Self {
            Self {
                bytes: RefCell::new([0; SIZE]),
                busy_polls: Cell::new(0),
                erased: Cell::new(0xFF),
                corrupt: Cell::new(0),
            }
        }

        fn offset(address: u32) -> usize {
            (address - BASE) as usize
        }
    }

    struct RamFlash<'m>(&'m Memory);

    impl FlsArch for RamFlash<'_> {
        fn init(&mut self) {}

        fn start_erase(&mut self, address: u32) -> Result<(), FlsArchError> {
            let start = Memory::offset(address);
            self.0.bytes.borrow_mut()[start..start + 256].fill(self.0.erased.get());
            if self.0.busy_polls.get() != u32::MAX {
                self.0.busy_polls.set(2);
            }
            Ok(())
        }

        fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlsArchError> {
            let start = Memory::offset(address);
            let mut bytes = self.0.bytes.borrow_mut();
            bytes[start..start + data.len()].copy_from_slice(data);
            bytes[start] ^= self.0.corrupt.get();
            Ok(())
        }

        fn read(&self, address: u32, buffer: &mut [u8]) {
            let start = Memory::offset(address);
            buffer.copy_from_slice(&self.0.bytes.borrow()[start..start + buffer.len()]);
        }

        fn is_busy(&self) -> bool {
            match self.0.busy_polls.get() {
                0 => false,
                u32::MAX => true,
                polls => {
                    self.0.busy_polls.set(polls - 1);
                    true
                }
            }
        }

        fn take_error(&mut self) -> Option<FlsArchError> {
            None
        }
    }

    fn config() -> FlsConfig {
        FlsConfig {
            memory_base: 0x0800_0000,
            erase_start: BASE,
            sector_size: 256,
            sector_count: 4,
            page_size: 8,
            erased_value: 0xFF,
            max_read_fast: 64,
            max_read_slow: 16,
            max_write_fast: 32,
            max_write_slow: 8,
            default_mode: FlsMode::Slow,
            job_end_notification: None,
            job_error_notification: None,
        }
    }

    fn run<A: FlsArch, D: Det + ?Sized>(fls: &mut Fls<'_, A, D>) -> usize {
        let mut cycles = 0;
        while fls.get_status() == FlsStatus::Busy && cycles < 10 * ERASE_POLL_LIMIT as usize {
            fls.main_function();
            cycles += 1;
        }
        cycles
    }

    #[test]
    fn test_init() {
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        let broken = FlsConfig {
            page_size: 0,
            ..config
        };

        assert_eq!(fls.get_status(), FlsStatus::Uninit);
        assert_eq!(fls.get_job_result(), JobResult::Failed);
        assert!(det.contains_error(MODULE_ID, api::GET_JOB_RESULT, error::UNINIT));

        assert_eq!(fls.init(None), Err(NotOk));
        assert_eq!(fls.init(Some(&broken)), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::INIT, error::PARAM_CONFIG));

        assert_eq!(fls.init(Some(&config)), Ok(()));
        assert_eq!(fls.get_status(), FlsStatus::Idle);
        assert_eq!(fls.get_job_result(), JobResult::Ok);
        assert_eq!(fls.init(Some(&config)), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::INIT, error::ALREADY_INITIALIZED));
    }

    #[test]
    fn test_jobs_before_init_report_uninit() {
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);

        assert_eq!(fls.erase(0, 256), Err(NotOk));
        assert_eq!(fls.write(0, Some(&[0; 8])), Err(NotOk));
        fls.main_function();
        assert!(det.contains_error(MODULE_ID, api::ERASE, error::UNINIT));
        assert!(det.contains_error(MODULE_ID, api::WRITE, error::UNINIT));
        assert!(det.contains_error(MODULE_ID, api::MAIN_FUNCTION, error::UNINIT));
    }

    #[test]
    fn test_erase_job() {
        static ENDS: AtomicU32 = AtomicU32::new(0);
        fn on_end() {
            ENDS.fetch_add(1, Ordering::SeqCst);
        }

        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = FlsConfig {
            job_end_notification: Some(on_end),
            ..config()
        };
        fls.init(Some(&config)).unwrap();

        assert_eq!(fls.erase(256, 512), Ok(()));
        assert_eq!(fls.get_status(), FlsStatus::Busy);
        assert_eq!(fls.get_job_result(), JobResult::Pending);

        // Start, two busy polls and verify for each sector
        assert_eq!(run(&mut fls), 8);
        assert_eq!(fls.get_status(), FlsStatus::Idle);
        assert_eq!(fls.get_job_result(), JobResult::Ok);
        assert_eq!(ENDS.load(Ordering::SeqCst), 1);

        let bytes = memory.bytes.borrow();
        assert!(bytes[..256].iter().all(|&b| b == 0));
        assert!(bytes[256..768].iter().all(|&b| b == 0xFF));
        assert!(bytes[768..].iter().all(|&b| b == 0));
        assert!(det.is_empty());
    }

    #[test]
    fn test_erase_rejects_bad_ranges() {
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        fls.init(Some(&config)).unwrap();

        assert_eq!(fls.erase(100, 256), Err(NotOk));
        assert_eq!(fls.erase(1024, 256), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::ERASE, error::PARAM_ADDRESS));
        assert_eq!(fls.erase(0, 0), Err(NotOk));
        assert_eq!(fls.erase(0, 100), Err(NotOk));
        assert_eq!(fls.erase(768, 512), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::ERASE, error::PARAM_LENGTH));
        assert_eq!(fls.get_status(), FlsStatus::Idle);

        fls.erase(0, 256).unwrap();
        assert_eq!(fls.erase(256, 256), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::ERASE, error::BUSY));
    }

    #[test]
    fn test_erase_verify_failure() {
        let memory = Memory::new();
        memory.erased.set(0x7F);
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        fls.init(Some(&config)).unwrap();

        fls.erase(0, 512).unwrap();
        run(&mut fls);

        assert_eq!(fls.get_job_result(), JobResult::Failed);
        assert!(det.contains_runtime_error(
            MODULE_ID,
            api::MAIN_FUNCTION,
            error::VERIFY_ERASE_FAILED
        ));
    }

    #[test]
    fn test_erase_timeout() {
        let memory = Memory::new();
        memory.busy_polls.set(u32::MAX);
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        fls.init(Some(&config)).unwrap();

        fls.erase(0, 256).unwrap();
        assert_eq!(run(&mut fls), ERASE_POLL_LIMIT as usize + 1);

        assert_eq!(fls.get_job_result(), JobResult::Failed);
        assert!(det.contains_runtime_error(MODULE_ID, api::MAIN_FUNCTION, error::TIMEOUT));
    }

    #[test]
    fn test_write_job_in_slices() {
        static DATA: [u8; 24] = [
            1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        ];
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        fls.init(Some(&config)).unwrap();

        assert_eq!(fls.write(16, Some(&DATA)), Ok(()));
        fls.main_function();
        assert_eq!(fls.get_job_result(), JobResult::Pending);
        assert_eq!(memory.bytes.borrow()[16..24], DATA[..8]);
        assert_eq!(memory.bytes.borrow()[24..32], [0; 8]);

        assert_eq!(run(&mut fls), 2);
        assert_eq!(fls.get_job_result(), JobResult::Ok);
        assert_eq!(memory.bytes.borrow()[16..40], DATA);
    }

    #[test]
    fn test_write_rejects_bad_arguments() {
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = config();
        fls.init(Some(&config)).unwrap();

        assert_eq!(fls.write(3, Some(&[0; 8])), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::WRITE, error::PARAM_ADDRESS));
        assert_eq!(fls.write(0, Some(&[0; 12])), Err(NotOk));
        assert_eq!(fls.write(1016, Some(&[0; 16])), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::WRITE, error::PARAM_LENGTH));
        assert_eq!(fls.write(0, None), Err(NotOk));
        assert!(det.contains_error(MODULE_ID, api::WRITE, error::PARAM_DATA));
    }

    #[test]
    fn test_write_verify_failure() {
        static ERRORS: AtomicU32 = AtomicU32::new(0);
        fn on_error() {
            ERRORS.fetch_add(1, Ordering::SeqCst);
        }

        let memory = Memory::new();
        memory.corrupt.set(0x01);
        let det = RecordingDet::<8>::new();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        let config = FlsConfig {
            job_error_notification: Some(on_error),
            ..config()
        };
        fls.init(Some(&config)).unwrap();

        fls.write(0, Some(&[0xAA; 16])).unwrap();
        assert_eq!(run(&mut fls), 1);

        assert_eq!(fls.get_job_result(), JobResult::Failed);
        assert_eq!(ERRORS.load(Ordering::SeqCst), 1);
        assert!(det.contains_runtime_error(
            MODULE_ID,
            api::MAIN_FUNCTION,
            error::VERIFY_WRITE_FAILED
        ));
    }

    #[test]
    fn test_read_job_returns_buffer() {
        let memory = Memory::new();
        for (index, byte) in memory.bytes.borrow_mut().iter_mut().enumerate() {
            *byte = index as u8;
        }
        let det = RecordingDet::<8>::new();
        let config = config();
        let mut buffer = [0u8; 40];
        let mut fls = Fls::new(RamFlash(&memory), &det);
        fls.init(Some(&config)).unwrap();
        fls.set_mode(FlsMode::Fast);

        assert_eq!(fls.read(10, Some(&mut buffer)), Ok(()));
        assert!(fls.take_buffer().is_none());
        assert_eq!(run(&mut fls), 1);
        assert_eq!(fls.get_job_result(), JobResult::Ok);

        let data = fls.take_buffer().unwrap();
        assert_eq!(data.len(), 40);
        assert_eq!(data[0], 10);
        assert_eq!(data[39], 49);
    }

    #[test]
    fn test_compare_and_blank_check() {
        let memory = Memory::new();
        memory.bytes.borrow_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
        memory.bytes.borrow_mut()[512..].fill(0xFF);
        let det = RecordingDet::<8>::new();
        let config = config();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        fls.init(Some(&config)).unwrap();

        fls.compare(0, Some(&[1, 2, 3, 4])).unwrap();
        run(&mut fls);
        assert_eq!(fls.get_job_result(), JobResult::Ok);

        fls.compare(0, Some(&[1, 2, 3, 5])).unwrap();
        run(&mut fls);
        assert_eq!(fls.get_job_result(), JobResult::BlockInconsistent);

        fls.blank_check(512, 512).unwrap();
        assert_eq!(run(&mut fls), 32);
        assert_eq!(fls.get_job_result(), JobResult::Ok);

        fls.blank_check(500, 100).unwrap();
        run(&mut fls);
        assert_eq!(fls.get_job_result(), JobResult::BlockInconsistent);
        assert!(det.is_empty());
    }

    #[test]
    fn test_cancel() {
        static ERRORS: AtomicU32 = AtomicU32::new(0);
        fn on_error() {
            ERRORS.fetch_add(1, Ordering::SeqCst);
        }

        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let config = FlsConfig {
            job_error_notification: Some(on_error),
            ..config()
        };
        let mut fls = Fls::new(RamFlash(&memory), &det);
        fls.init(Some(&config)).unwrap();

        fls.write(0, Some(&[0x55; 64])).unwrap();
        fls.main_function();
        fls.cancel();

        assert_eq!(fls.get_status(), FlsStatus::Idle);
        assert_eq!(fls.get_job_result(), JobResult::Canceled);
        assert_eq!(ERRORS.load(Ordering::SeqCst), 1);
        assert_eq!(memory.bytes.borrow()[8], 0);

        // Nothing to cancel
        fls.cancel();
        assert_eq!(ERRORS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_mode_refused_while_busy() {
        let memory = Memory::new();
        let det = RecordingDet::<8>::new();
        let config = config();
        let mut fls = Fls::new(RamFlash(&memory), &det);
        fls.init(Some(&config)).unwrap();

        fls.blank_check(0, 64).unwrap();
        fls.set_mode(FlsMode::Fast);
        assert!(det.contains_error(MODULE_ID, api::SET_MODE, error::BUSY));
        assert_eq!(fls.mode(), FlsMode::Slow);

        run(&mut fls);
        fls.set_mode(FlsMode::Fast);
        assert_eq!(fls.mode(), FlsMode::Fast);
    }
}

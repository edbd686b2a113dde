//! Internal flash access

/// Errors from flash hardware operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlsArchError {
    /// An operation is still in progress
    Busy,
    /// The controller reported a programming error
    Program,
    /// Address or length not aligned to the hardware granule
    Alignment,
    /// The controller stayed busy past the polling limit
    Timeout,
}

/// Drives the flash interface
///
/// Addresses are absolute. Erase is started and then polled with
/// [`FlsArch::is_busy`]; programming one granule completes before
/// [`FlsArch::program`] returns.
pub trait FlsArch {
    /// Unlock the controller and clear stale error flags
    fn init(&mut self);

    /// Start erasing the sector containing `address`
    fn start_erase(&mut self, address: u32) -> Result<(), FlsArchError>;

    /// Program `data` at `address`
    ///
    /// `data` is a whole number of program granules.
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlsArchError>;

    /// Copy flash content at `address` into `buffer`
    fn read(&self, address: u32, buffer: &mut [u8]);

    fn is_busy(&self) -> bool;

    /// Error flags raised by the last finished operation, if any
    fn take_error(&mut self) -> Option<FlsArchError>;
}

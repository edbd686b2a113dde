//! Hardware-unit state object

/// Lifecycle state of a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Created, configuration not yet captured
    #[default]
    Uninit,
    /// Configuration captured, driver usable
    Init,
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleError {
    /// `init` called on an initialized unit
    AlreadyInitialized,
    /// Operation requires an initialized unit
    Uninit,
}

/// Lifecycle state plus the borrowed configuration
///
/// Transitions: `Uninit --init--> Init --deinit--> Uninit`. A failed
/// transition leaves the unit untouched, in particular a second `init`
/// keeps the first configuration.
#[derive(Debug)]
pub struct HwUnit<'a, C> {
    config: Option<&'a C>,
    state: DriverState,
}

impl<C> Default for HwUnit<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, C> HwUnit<'a, C> {
    /// Create an uninitialized unit
    pub const fn new() -> Self {
        Self {
            config: None,
            state: DriverState::Uninit,
        }
    }

    /// Capture `config` and move to `Init`
    pub fn init(&mut self, config: &'a C) -> Result<(), LifecycleError> {
        if self.state == DriverState::Init {
            return Err(LifecycleError::AlreadyInitialized);
        }
        self.config = Some(config);
        self.state = DriverState::Init;
        Ok(())
    }

    /// Release the configuration and move back to `Uninit`
    pub fn deinit(&mut self) -> Result<(), LifecycleError> {
        if self.state != DriverState::Init {
            return Err(LifecycleError::Uninit);
        }
        self.config = None;
        self.state = DriverState::Uninit;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Check if the unit is initialized
    pub fn is_init(&self) -> bool {
        self.state == DriverState::Init
    }

    /// Active configuration, `None` while uninitialized
    pub fn config(&self) -> Option<&'a C> {
        match self.state {
            DriverState::Init => self.config,
            DriverState::Uninit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let first = 1u8;
        let mut unit: HwUnit<'_, u8> = HwUnit::new();
        assert_eq!(unit.state(), DriverState::Uninit);
        assert!(unit.config().is_none());

        unit.init(&first).unwrap();
        assert!(unit.is_init());
        assert_eq!(unit.config(), Some(&1));

        unit.deinit().unwrap();
        assert_eq!(unit.state(), DriverState::Uninit);
        assert!(unit.config().is_none());
    }

    #[test]
    fn test_double_init_keeps_first_config() {
        let first = 1u8;
        let second = 2u8;
        let mut unit = HwUnit::new();

        unit.init(&first).unwrap();
        assert_eq!(unit.init(&second), Err(LifecycleError::AlreadyInitialized));
        assert_eq!(unit.config(), Some(&1));
    }

    #[test]
    fn test_deinit_requires_init() {
        let mut unit: HwUnit<'_, u8> = HwUnit::new();
        assert_eq!(unit.deinit(), Err(LifecycleError::Uninit));
    }
}

//! Configuration object and helpers for the simulated cluster state provider.
mod loading;
mod object;
mod runtime;

pub use self::loading::load;
pub use self::loading::Error;
pub use self::object::Conf;
pub use self::object::SimulatorConf;
pub use self::runtime::RuntimeConf;

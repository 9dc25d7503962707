use std::{fmt, ops::RangeInclusive, rc::Rc};

/// Handler for a memory-mapped address range.
///
/// Every access to an address inside the mapped range is routed to the
/// device. The backing array is handed in so that a device can keep plain
/// storage semantics and only add side effects.
pub trait Device {
    fn read(&mut self, mem: &[u16], addr: u16) -> u16 {
        mem[addr as usize]
    }

    fn write(&mut self, mem: &mut [u16], addr: u16, value: u16) {
        mem[addr as usize] = value;
    }

    /// Called when the emulator starts running. May be called repeatedly.
    fn start(&mut self, _mem: &[u16]) {}

    /// Called when the emulator stops running. May be called repeatedly.
    fn stop(&mut self) {}
}

/// Builds a fresh device instance; constructor arguments are captured.
pub type Factory = Rc<dyn Fn() -> Box<dyn Device>>;

/// Extension descriptor: the mapped range and how to build its handler.
#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub range: RangeInclusive<u16>,
    pub factory: Factory,
}

impl Extension {
    pub fn new(
        name: &str,
        range: RangeInclusive<u16>,
        factory: impl Fn() -> Box<dyn Device> + 'static,
    ) -> Self {
        Extension {
            name: name.to_string(),
            range,
            factory: Rc::new(factory),
        }
    }

    pub fn contains(&self, addr: u16) -> bool {
        self.range.contains(&addr)
    }

    pub fn build(&self) -> Box<dyn Device> {
        (self.factory)()
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extension({} 0x{:04X}..=0x{:04X})",
            self.name,
            self.range.start(),
            self.range.end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Device for Doubler {
        fn read(&mut self, mem: &[u16], addr: u16) -> u16 {
            mem[addr as usize].wrapping_mul(2)
        }
    }

    #[test]
    fn default_device_is_plain_storage() {
        struct Plain;
        impl Device for Plain {}

        let mut mem = vec![0u16; 4];
        let mut dev = Plain;
        dev.write(&mut mem, 2, 7);
        assert_eq!(dev.read(&mem, 2), 7);
        assert_eq!(mem[2], 7);
    }

    #[test]
    fn extension_builds_devices() {
        let ext = Extension::new("doubler", 0x10..=0x1F, || Box::new(Doubler));
        assert!(ext.contains(0x10));
        assert!(ext.contains(0x1F));
        assert!(!ext.contains(0x20));

        let mem = vec![21u16; 0x20];
        assert_eq!(ext.build().read(&mem, 0x11), 42);
        assert_eq!(
            format!("{:?}", ext),
            "Extension(doubler 0x0010..=0x001F)"
        );
    }
}

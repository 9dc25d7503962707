use std::ops::{Index, RangeInclusive};

use arch::{
    decode::Fetch,
    device::{Device, Extension},
    MEMORY_SIZE,
};

use crate::error::Error;

/// The 64K word address space. Accesses inside an installed range go to its
/// device; everything else uses the backing array.
pub struct Memory {
    words: Vec<u16>,
    devices: Vec<(RangeInclusive<u16>, Box<dyn Device>)>,
}

impl Memory {
    /// Memory holding `image` from address 0, zero elsewhere.
    pub fn new(image: &[u16]) -> Result<Self, Error> {
        if image.len() > MEMORY_SIZE {
            return Err(Error::Bounds(image.len()));
        }
        let mut words = vec![0; MEMORY_SIZE];
        words[..image.len()].copy_from_slice(image);
        Ok(Memory {
            words,
            devices: vec![],
        })
    }

    /// Map a fresh device for `ext`. Earlier installations win where ranges
    /// overlap.
    pub fn install(&mut self, ext: &Extension) {
        self.devices.push((ext.range.clone(), ext.build()));
    }

    pub fn devices(&self) -> usize {
        self.devices.len()
    }

    pub fn read(&mut self, addr: usize) -> Result<u16, Error> {
        let addr = Self::check(addr)?;
        Ok(self.load(addr))
    }

    pub fn write(&mut self, addr: usize, value: u16) -> Result<(), Error> {
        let addr = Self::check(addr)?;
        self.store(addr, value);
        Ok(())
    }

    pub fn start(&mut self) {
        for (_, dev) in self.devices.iter_mut() {
            dev.start(&self.words);
        }
    }

    pub fn stop(&mut self) {
        for (_, dev) in self.devices.iter_mut() {
            dev.stop();
        }
    }

    /// The backing array, bypassing devices.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    fn check(addr: usize) -> Result<u16, Error> {
        u16::try_from(addr).map_err(|_| Error::Bounds(addr))
    }

    fn load(&mut self, addr: u16) -> u16 {
        match self.devices.iter_mut().find(|(range, _)| range.contains(&addr)) {
            Some((_, dev)) => dev.read(&self.words, addr),
            None => self.words[addr as usize],
        }
    }

    fn store(&mut self, addr: u16, value: u16) {
        match self.devices.iter_mut().find(|(range, _)| range.contains(&addr)) {
            Some((_, dev)) => dev.write(&mut self.words, addr, value),
            None => self.words[addr as usize] = value,
        }
    }
}

/// Instruction fetch goes through devices like any other read.
impl Fetch for Memory {
    fn fetch(&mut self, addr: u16) -> u16 {
        self.load(addr)
    }
}

impl Index<usize> for Memory {
    type Output = u16;

    fn index(&self, addr: usize) -> &u16 {
        &self.words[addr]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    /// Records every call it receives.
    struct Probe(Rc<RefCell<Vec<String>>>);

    impl Device for Probe {
        fn read(&mut self, _mem: &[u16], addr: u16) -> u16 {
            self.0.borrow_mut().push(format!("read {:x}", addr));
            0xAAAA
        }

        fn write(&mut self, _mem: &mut [u16], addr: u16, value: u16) {
            self.0.borrow_mut().push(format!("write {:x} {:x}", addr, value));
        }

        fn start(&mut self, _mem: &[u16]) {
            self.0.borrow_mut().push("start".to_string());
        }

        fn stop(&mut self) {
            self.0.borrow_mut().push("stop".to_string());
        }
    }

    fn probe(range: RangeInclusive<u16>) -> (Extension, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(vec![]));
        let shared = log.clone();
        let ext = Extension::new("probe", range, move || Box::new(Probe(shared.clone())));
        (ext, log)
    }

    #[test]
    fn image_is_loaded_at_zero() {
        let mem = Memory::new(&[1, 2, 3]).unwrap();
        assert_eq!(mem.words().len(), MEMORY_SIZE);
        assert_eq!(&mem.words()[..4], &[1, 2, 3, 0]);
        assert_eq!(mem[2], 3);
    }

    #[test]
    fn bounds() {
        assert!(matches!(
            Memory::new(&vec![0u16; MEMORY_SIZE + 1]),
            Err(Error::Bounds(_))
        ));
        let mut mem = Memory::new(&[]).unwrap();
        assert!(matches!(mem.read(0x10000), Err(Error::Bounds(0x10000))));
        assert!(matches!(mem.write(0x10000, 1), Err(Error::Bounds(0x10000))));
        assert!(mem.write(0xFFFF, 1).is_ok());
        assert_eq!(mem.read(0xFFFF).unwrap(), 1);
    }

    #[test]
    fn devices_intercept_their_range() {
        let (ext, log) = probe(0x8000..=0x8001);
        let mut mem = Memory::new(&[]).unwrap();
        mem.install(&ext);

        mem.write(0x8001, 5).unwrap();
        mem.write(0x8002, 6).unwrap();
        assert_eq!(mem.read(0x8000).unwrap(), 0xAAAA);
        assert_eq!(mem.read(0x8002).unwrap(), 6);
        assert_eq!(mem.words()[0x8001], 0);

        mem.start();
        mem.stop();
        mem.stop();
        assert_eq!(
            *log.borrow(),
            vec!["write 8001 5", "read 8000", "start", "stop", "stop"]
        );
    }

    #[test]
    fn first_installed_device_wins() {
        let (first, first_log) = probe(0x10..=0x1F);
        let (second, second_log) = probe(0x18..=0x20);
        let mut mem = Memory::new(&[]).unwrap();
        mem.install(&first);
        mem.install(&second);

        mem.read(0x18).unwrap();
        mem.read(0x20).unwrap();
        assert_eq!(*first_log.borrow(), vec!["read 18"]);
        assert_eq!(*second_log.borrow(), vec!["read 20"]);
        assert_eq!(mem.devices(), 2);
    }
}

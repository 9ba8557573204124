#![no_main]

use libfuzzer_sys::fuzz_target;
use publicizer::{publicize, Module, PublicizeOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut module) = Module::from_mem(data.to_vec()) {
        publicize(&mut module, &PublicizeOptions::default());
        let _ = module.tables();
    }
});

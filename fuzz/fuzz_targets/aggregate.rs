#![no_main]

use grindtree::convert::{self, Options};
use grindtree::render::{self, Format};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(tree) = convert::aggregate(input, &Options::default()) {
            render::write(Format::Dot, &tree, std::io::sink()).ok();
            render::write(Format::Xml, &tree, std::io::sink()).ok();
        }
    }
});

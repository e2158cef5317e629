use std::io;
use std::path;

use env_logger;
use log;

use int_ext_sort::{ExternalSorter, ExternalSorterBuilder};

fn main() {
    env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();

    let input = "10\n1\n6\n3\n8\n7\n5\n9\n4\n2\n0\n";

    let sorter: ExternalSorter = ExternalSorterBuilder::new()
        .with_chunk_size(3)
        .with_tmp_dir(path::Path::new("./"))
        .build()
        .unwrap();

    let sorted = sorter.sort(io::Cursor::new(input)).unwrap();
    log::info!("result is stored in working slot {}", sorted.result_slot());

    for item in sorted.values().unwrap().map(Result::unwrap) {
        println!("{}", item);
    }
}

#![no_main]
use libfuzzer_sys::fuzz_target;
use tof_core::median::MedianFilter;

fuzz_target!(|input: (u8, Vec<i32>)| {
    let (window, samples) = input;
    let mut f = MedianFilter::new(usize::from(window));
    for s in samples {
        f.add_sample(s);
        let m = f.get_median().expect("non-empty after add");
        assert!(f.samples().any(|x| x == m));
        assert!(f.len() <= f.capacity());
    }
});

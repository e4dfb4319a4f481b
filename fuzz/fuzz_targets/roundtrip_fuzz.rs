#![no_main]
use libfuzzer_sys::fuzz_target;
use lzmatch::codec::{CompressOptions, Format};
use lzmatch::matching::FinderKind;
use lzmatch::parser::ParserKind;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, payload)) = data.split_first() else {
        return;
    };

    // First byte picks the pipeline.
    let format = Format::ALL[usize::from(flags & 3) % Format::ALL.len()];
    let parser = match (flags >> 2) & 3 {
        0 => ParserKind::Greedy,
        1 => ParserKind::BackwardForward,
        _ => ParserKind::Optimal,
    };
    let finder = match (flags >> 4) & 3 {
        0 => FinderKind::NeedleHaystack,
        1 => FinderKind::HashChain,
        _ => FinderKind::SuffixTree,
    };
    let opts = CompressOptions {
        parser,
        finder,
        chain_depth: usize::from(flags >> 6) * 8,
    };

    let packed = format.compress(payload, &opts).unwrap();
    let unpacked = format.decompress(&packed).unwrap();
    assert_eq!(unpacked, payload);
});

//! Property: the CSS minifier is idempotent, so pipelines that minify are
//! safe to re-run in watch-triggered rebuilds.

use proptest::prelude::*;

use pipeforge::pipeline::FileRecord;
use pipeforge::transform::{CssMinifyStep, TransformStep};

fn minify(text: &str) -> String {
    let out = CssMinifyStep
        .apply(vec![FileRecord::new("a.css", text.as_bytes().to_vec())])
        .unwrap();
    out[0].text().unwrap().to_string()
}

proptest! {
    #[test]
    fn minify_is_idempotent(input in "[ -~\\n\\t]{0,200}") {
        let once = minify(&input);
        let twice = minify(&once);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn minify_never_grows_output(input in "[ -~\\n\\t]{0,200}") {
        let once = minify(&input);
        prop_assert!(once.len() <= input.len());
    }
}

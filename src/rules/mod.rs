//! A representative sample of MD0xx rules, each grounded on the teacher's
//! rule of the same number but rebuilt against this crate's token-stream
//! dispatch model (§4.H) rather than the teacher's whole-document regex
//! scan over `LintContext`.

pub mod md003_heading_style;
pub mod md009_trailing_spaces;
pub mod md012_no_multiple_blanks;
pub mod md013_line_length;
pub mod md029_ordered_list_prefix;
pub mod md049_emphasis_style;
pub mod md052_reference_links_images;

use crate::rule::Rule;

/// All rules this build knows about, in no particular order — the
/// dispatcher sorts by id at registration time.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(md003_heading_style::Md003HeadingStyle::default()),
        Box::new(md009_trailing_spaces::Md009TrailingSpaces::default()),
        Box::new(md012_no_multiple_blanks::Md012NoMultipleBlanks::default()),
        Box::new(md013_line_length::Md013LineLength::default()),
        Box::new(md029_ordered_list_prefix::Md029OrderedListPrefix::default()),
        Box::new(md049_emphasis_style::Md049EmphasisStyle::default()),
        Box::new(md052_reference_links_images::Md052ReferenceLinksImages::default()),
    ]
}

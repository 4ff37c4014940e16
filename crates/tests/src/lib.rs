
#[cfg(test)]
mod authoring_tests;
#[cfg(test)]
mod check_tests;
#[cfg(test)]
mod translation_tests;

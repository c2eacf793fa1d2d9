use serde::Serialize;

use crate::{generate::TestCase, model::ApiSpec};

use super::IntoExport;

/// A `cases.json` listing of an API and its test cases, in
/// generation order.
#[derive(Clone, Copy, Debug)]
pub struct CasesFile<'a> {
    spec: &'a ApiSpec,
    cases: &'a [TestCase],
}

impl<'a> CasesFile<'a> {
    pub const PATH: &'static str = "cases.json";

    #[inline]
    pub fn new(spec: &'a ApiSpec, cases: &'a [TestCase]) -> Self {
        Self { spec, cases }
    }
}

#[derive(Serialize)]
pub struct Listing<'a> {
    spec: &'a ApiSpec,
    total: usize,
    cases: &'a [TestCase],
}

impl<'a> IntoExport for CasesFile<'a> {
    type Export = (&'static str, Listing<'a>);

    fn into_export(self) -> Self::Export {
        (
            Self::PATH,
            Listing {
                spec: self.spec,
                total: self.cases.len(),
                cases: self.cases,
            },
        )
    }
}

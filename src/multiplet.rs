//! Locate query multiplets in a target spectrum by sliding-window correlation.
//!
//! For each multiplet window, the query intensities inside the window form a
//! template. The template is slid one index at a time across a padded region of
//! the target spectrum, scoring every offset with [`norm_xcorr`]. The best
//! scoring offsets are de-duplicated with [`multiplet_match_trimming`] and
//! mapped back onto the target's ppm axis.
//!
//! The scan is an explicit per-offset loop rather than an FFT correlation, so
//! each multiplet costs `O(region length × template length)`.
//!
//! # Usage
//! ```
//! use std::collections::HashMap;
//! use nmrmatch::{do_1d_std_search, Spectrum};
//!
//! let ppm: Vec<f64> = (0..30).rev().map(|i| i as f64 / 10.0).collect();
//! let mut intensity = vec![1.0; 30];
//! intensity[18] = 5.0;
//! intensity[19] = 9.0;
//! intensity[20] = 4.0;
//! let query = Spectrum::wrap(&ppm, &intensity).unwrap();
//! let target = query.with_ppm_offset(0.2);
//!
//! let results = do_1d_std_search(&query, &target, &[[0.7, 1.4]], &HashMap::new(), 0.5, false);
//! let found = results.get("multiplet_0").unwrap().as_ref().unwrap();
//! assert_eq!(found.best_rho(), Some(1.0));
//! ```
use std::collections::HashMap;
#[cfg(feature = "serde")]
use std::result::Result as StdResult;

use cfg_if::cfg_if;
use log::{debug, trace, warn};

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use crate::arrayops::isclose;
use crate::correlation::norm_xcorr;
use crate::error::{Result, SignalError};
use crate::search::{multiplet_match_trimming, window_range};
use crate::spectrum::{AxisOrder, Spectrum};

/// A pair of ppm coordinates bounding a multiplet. The bounds may be in either order.
pub type MultipletWindow = [f64; 2];

/// The options controlling how a multiplet window is resolved and searched
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
    /// The ppm margin added to each side of the multiplet window to form the
    /// target search region. The region is silently clipped to the target's extent.
    pub search_region_padding_size: f64,
    /// When set, window boundary indices are rounded down instead of keeping
    /// only the points strictly inside the window. See [`window_range`].
    pub floor_window: bool,
}

impl SearchConfig {
    pub fn new(search_region_padding_size: f64, floor_window: bool) -> Self {
        Self {
            search_region_padding_size,
            floor_window,
        }
    }
}

/// A builder for configuring [`SearchConfig`]
#[derive(Debug, Default, Clone)]
pub struct SearchConfigBuilder {
    search_region_padding_size: f64,
    floor_window: bool,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_region_padding_size(&mut self, search_region_padding_size: f64) -> &mut Self {
        self.search_region_padding_size = search_region_padding_size;
        self
    }

    pub fn floor_window(&mut self, floor_window: bool) -> &mut Self {
        self.floor_window = floor_window;
        self
    }

    pub fn build(&self) -> SearchConfig {
        SearchConfig::new(self.search_region_padding_size, self.floor_window)
    }
}

impl From<SearchConfigBuilder> for SearchConfig {
    fn from(value: SearchConfigBuilder) -> Self {
        value.build()
    }
}

/// The outcome of searching for one multiplet
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchResult {
    /// The correlation score at every offset scanned, in scan order
    pub rho_ls: Vec<f64>,
    /// The multiplet window as it was given
    pub coords: MultipletWindow,
    /// The number of points in the template
    pub multiplet_len_idx: usize,
    /// The ppm width of the multiplet window
    pub multiplet_len_ppm: f64,
    /// The best scoring offsets into `rho_ls`, after trimming near duplicates
    pub multiplet_match_idx: Vec<usize>,
    /// For each entry of `multiplet_match_idx`, the ppm interval the match
    /// covers in the target, given in the target's scan order
    pub multiplet_match_ppm: Vec<[f64; 2]>,
    /// The index in the target spectrum where the search region starts
    pub search_start_idx: usize,
}

impl MatchResult {
    /// The highest correlation score seen, if any offset was scanned
    pub fn best_rho(&self) -> Option<f64> {
        self.rho_ls
            .iter()
            .copied()
            .filter(|r| !r.is_nan())
            .reduce(f64::max)
    }

    /// The best matches as absolute indices into the target spectrum
    pub fn match_target_indices(&self) -> Vec<usize> {
        self.multiplet_match_idx
            .iter()
            .map(|i| i + self.search_start_idx)
            .collect()
    }
}

/// Score `template` against every window of `region` it fits in.
///
/// A window with no variance has no linear relationship to the template and
/// scores `0.0`.
pub fn scan_correlation(template: &[f64], region: &[f64]) -> Vec<f64> {
    if template.is_empty() || region.len() < template.len() {
        return Vec::new();
    }
    let trace_enabled = log::log_enabled!(log::Level::Trace);
    region
        .windows(template.len())
        .enumerate()
        .map(|(offset, window)| {
            let rho = norm_xcorr(template, window).unwrap_or(0.0);
            if trace_enabled {
                trace!("offset {offset}: rho = {rho:0.5}");
            }
            rho
        })
        .collect()
}

/// The offsets scoring (approximately) as well as the best offset, left to right
fn best_offsets(rho_ls: &[f64]) -> Vec<usize> {
    let best = match rho_ls.iter().copied().filter(|r| !r.is_nan()).reduce(f64::max) {
        Some(best) => best,
        None => return Vec::new(),
    };
    rho_ls
        .iter()
        .enumerate()
        .filter(|(_, rho)| isclose(**rho, best))
        .map(|(i, _)| i)
        .collect()
}

/// Search `target` for the multiplet described by `template` and `window`.
///
/// This is the shared implementation behind [`search_multiplet`], exposed so a
/// caller can supply a template that did not come from a query spectrum.
pub fn search_template(
    template: &[f64],
    target: &Spectrum<'_>,
    window: MultipletWindow,
    config: &SearchConfig,
) -> Result<MatchResult> {
    if template.is_empty() || template.iter().all(|v| *v == template[0]) {
        return Err(SignalError::DegenerateInput(
            "the multiplet template has no variance",
        ));
    }
    let [a, b] = window;
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let padding = config.search_region_padding_size;

    let region = window_range(
        target.ppm(),
        low - padding,
        high + padding,
        config.floor_window,
    )?;
    let region_ppm = &target.ppm()[region.clone()];
    let region_intensity = &target.intensity()[region.clone()];

    let multiplet_len_idx = template.len();
    let multiplet_len_ppm = high - low;

    if region_intensity.len() < multiplet_len_idx {
        warn!(
            "Search region {}..{} of {} points is narrower than the {} point template for window {:?}",
            low - padding,
            high + padding,
            region_intensity.len(),
            multiplet_len_idx,
            window
        );
    }

    let rho_ls = scan_correlation(template, region_intensity);
    let multiplet_match_idx = multiplet_match_trimming(&best_offsets(&rho_ls), multiplet_len_idx);

    let order = target.order();
    let multiplet_match_ppm = multiplet_match_idx
        .iter()
        .map(|offset| {
            let first = region_ppm[*offset];
            let last = region_ppm[offset + multiplet_len_idx - 1];
            let top = first.max(last);
            match order {
                AxisOrder::Descending => [top, top - multiplet_len_ppm],
                AxisOrder::Ascending => [top - multiplet_len_ppm, top],
            }
        })
        .collect();

    let result = MatchResult {
        rho_ls,
        coords: window,
        multiplet_len_idx,
        multiplet_len_ppm,
        multiplet_match_idx,
        multiplet_match_ppm,
        search_start_idx: region.start,
    };
    debug!(
        "Window {:?}: {} point template over {} point region starting at {}, best rho {:?} at {:?}",
        window,
        multiplet_len_idx,
        region.len(),
        region.start,
        result.best_rho(),
        result.multiplet_match_idx
    );
    Ok(result)
}

/// Search `target` for the part of `query` inside `window`.
///
/// The target is searched over the window widened by `config.search_region_padding_size`
/// ppm on each side, clipped to the target's extent.
///
/// # Errors
/// - [`SignalError::OutOfRange`] if the window selects no query points, or the
///   padded region selects no target points.
/// - [`SignalError::DegenerateInput`] if the query points in the window are constant.
pub fn search_multiplet_with(
    query: &Spectrum<'_>,
    target: &Spectrum<'_>,
    window: MultipletWindow,
    config: &SearchConfig,
) -> Result<MatchResult> {
    let [low, high] = window;
    let span = window_range(query.ppm(), low, high, config.floor_window)?;
    search_template(&query.intensity()[span], target, window, config)
}

/// Search `target` for the part of `query` inside `window`, looking up to
/// `padding` ppm beyond the window on either side.
///
/// Window boundaries keep only the points strictly inside the window. Use
/// [`search_multiplet_with`] to select the `floor_window` policy.
pub fn search_multiplet(
    query: &Spectrum<'_>,
    target: &Spectrum<'_>,
    window: MultipletWindow,
    padding: f64,
) -> Result<MatchResult> {
    search_multiplet_with(query, target, window, &SearchConfig::new(padding, false))
}

/// The per-multiplet outcomes of a batch search, in the order the windows were given.
///
/// Each entry is addressable by the key `"multiplet_<i>"`. A window which
/// failed records its error without affecting the other entries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchResults {
    results: Vec<Result<MatchResult>>,
}

impl SearchResults {
    pub fn new(results: Vec<Result<MatchResult>>) -> Self {
        Self { results }
    }

    /// The key for the multiplet at `index`
    pub fn key(index: usize) -> String {
        format!("multiplet_{index}")
    }

    /// Look up an entry by its `"multiplet_<i>"` key
    pub fn get(&self, key: &str) -> Option<&Result<MatchResult>> {
        let index: usize = key.strip_prefix("multiplet_")?.parse().ok()?;
        if Self::key(index) != key {
            return None;
        }
        self.results.get(index)
    }

    pub fn get_index(&self, index: usize) -> Option<&Result<MatchResult>> {
        self.results.get(index)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &Result<MatchResult>)> + '_ {
        self.results
            .iter()
            .enumerate()
            .map(|(i, r)| (Self::key(i), r))
    }

    /// Only the successful searches, with their keys
    pub fn matches(&self) -> impl Iterator<Item = (String, &MatchResult)> + '_ {
        self.iter().filter_map(|(k, r)| r.as_ref().ok().map(|m| (k, m)))
    }

    pub fn into_inner(self) -> Vec<Result<MatchResult>> {
        self.results
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize)]
struct ErrorMarker<'a> {
    error: String,
    kind: &'a SignalError,
}

#[cfg(feature = "serde")]
impl Serialize for SearchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len()))?;
        for (key, entry) in self.iter() {
            match entry {
                Ok(found) => map.serialize_entry(&key, found)?,
                Err(err) => map.serialize_entry(
                    &key,
                    &ErrorMarker {
                        error: err.to_string(),
                        kind: err,
                    },
                )?,
            }
        }
        map.end()
    }
}

/// Search `target` for every window in `multiplets`.
///
/// `query_l_dict` optionally replaces the template for a multiplet index with
/// the full intensity column of another spectrum, while the window still
/// decides the search region and reported width.
///
/// With the `parallelism` feature the windows are searched on the rayon
/// thread pool. The output order matches `multiplets` either way.
pub fn search_all(
    query: &Spectrum<'_>,
    target: &Spectrum<'_>,
    multiplets: &[MultipletWindow],
    query_l_dict: &HashMap<usize, Spectrum<'_>>,
    config: &SearchConfig,
) -> SearchResults {
    let search_one = |(index, window): (usize, &MultipletWindow)| -> Result<MatchResult> {
        let result = match query_l_dict.get(&index) {
            Some(custom) => search_template(custom.intensity(), target, *window, config),
            None => search_multiplet_with(query, target, *window, config),
        };
        if let Err(err) = &result {
            warn!("Search for {} failed: {err}", SearchResults::key(index));
        }
        result
    };

    SearchResults::new(map_windows(multiplets, search_one))
}

fn map_windows<F>(multiplets: &[MultipletWindow], search_one: F) -> Vec<Result<MatchResult>>
where
    F: Fn((usize, &MultipletWindow)) -> Result<MatchResult> + Sync + Send,
{
    cfg_if! {
        if #[cfg(feature = "parallelism")] {
            return multiplets.par_iter().enumerate().map(search_one).collect();
        } else {
            return multiplets.iter().enumerate().map(search_one).collect();
        }
    }
}

/// Search `target` for every window in `multiplets` using a `search_region_padding_size`
/// ppm margin and the given `floor_window` policy.
///
/// A thin wrapper around [`search_all`].
pub fn do_1d_std_search(
    query_df: &Spectrum<'_>,
    target_df: &Spectrum<'_>,
    multiplets_ls: &[MultipletWindow],
    query_l_dict: &HashMap<usize, Spectrum<'_>>,
    search_region_padding_size: f64,
    floor_window: bool,
) -> SearchResults {
    let config = SearchConfig::new(search_region_padding_size, floor_window);
    search_all(query_df, target_df, multiplets_ls, query_l_dict, &config)
}

#[cfg(test)]
mod test {
    use super::*;

    const QUERY: [f64; 28] = [
        1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 7.0, 10.0, 6.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0,
        1.0, 1.0, 1.0, 3.0, 5.0, 4.0, 2.0, 1.0, 1.0, 1.0,
    ];
    const TARGET: [f64; 30] = [
        1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 7.0, 10.0, 6.0, 1.0, 1.0, 2.0, 1.0, 1.0,
        1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 5.0, 4.0, 2.0, 1.0, 1.0, 1.0,
    ];

    /// Rows at `i / 10` ppm, ascending or sorted high ppm first
    fn spectrum_of(intensity: &[f64], descending: bool) -> Spectrum<'static> {
        let mut rows: Vec<(f64, f64)> = intensity
            .iter()
            .enumerate()
            .map(|(i, y)| (i as f64 / 10.0, *y))
            .collect();
        if descending {
            rows.reverse();
        }
        Spectrum::from_pairs(rows).unwrap()
    }

    fn assert_all_close(observed: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(observed.len(), expected.len(), "{observed:?} vs {expected:?}");
        for (i, (o, e)) in observed.iter().zip(expected.iter()).enumerate() {
            assert!((o - e).abs() < tol, "Observed {o}, expected {e} at {i}: {observed:?}");
        }
    }

    #[test_log::test]
    fn test_do_1d_std_search_descending() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);
        let results = do_1d_std_search(
            &query,
            &target,
            &[[0.1, 0.9], [0.7, 1.1]],
            &HashMap::new(),
            0.3,
            false,
        );
        assert_eq!(results.len(), 2);

        let first = results.get("multiplet_0").unwrap().as_ref().unwrap();
        assert_all_close(
            &first.rho_ls,
            &[0.76883751, 1.0, -0.30550505, 0.61101009, -0.19720266, -0.19720266],
            1e-6,
        );
        assert_eq!(first.coords, [0.1, 0.9]);
        assert_eq!(first.multiplet_len_idx, 7);
        assert!((first.multiplet_len_ppm - 0.8).abs() < 1e-9);
        assert_eq!(first.multiplet_match_idx, vec![1]);
        assert_all_close(&first.multiplet_match_ppm[0], &[1.0, 0.2], 1e-9);
        assert_eq!(first.search_start_idx, 18);
        assert_eq!(first.match_target_indices(), vec![19]);

        let second = results.get("multiplet_1").unwrap().as_ref().unwrap();
        assert_all_close(
            &second.rho_ls,
            &[
                -0.2773501, 0.30184385, 1.0, -0.05241424, -0.79701677, 0.97072534, -0.69337525,
                0.0, 0.0,
            ],
            1e-6,
        );
        assert_eq!(second.multiplet_len_idx, 3);
        assert!((second.multiplet_len_ppm - 0.4).abs() < 1e-9);
        assert_eq!(second.multiplet_match_idx, vec![2]);
        assert_all_close(&second.multiplet_match_ppm[0], &[1.2, 0.8], 1e-9);
    }

    #[test]
    fn test_ascending_axis_reports_same_interval() {
        let query = spectrum_of(&QUERY, false);
        let target = spectrum_of(&TARGET, false);
        let found = search_multiplet(&query, &target, [0.9, 0.1], 0.3).unwrap();
        assert_all_close(
            &found.rho_ls,
            &[-0.19720266, -0.19720266, 0.61101009, -0.30550505, 1.0, 0.76883751],
            1e-6,
        );
        assert_eq!(found.multiplet_match_idx, vec![4]);
        assert_all_close(&found.multiplet_match_ppm[0], &[0.2, 1.0], 1e-9);
        assert_eq!(found.match_target_indices(), vec![4]);
    }

    #[test]
    fn test_deterministic() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);
        let windows = [[0.1, 0.9], [0.7, 1.1], [2.0, 2.6]];
        let a = do_1d_std_search(&query, &target, &windows, &HashMap::new(), 0.3, false);
        let b = do_1d_std_search(&query, &target, &windows, &HashMap::new(), 0.3, false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_failures_are_isolated() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);
        let results = do_1d_std_search(
            &query,
            &target,
            &[[0.1, 0.9], [50.0, 60.0], [1.45, 1.75], [0.7, 1.1]],
            &HashMap::new(),
            0.3,
            false,
        );
        assert_eq!(results.len(), 4);
        assert!(results.get("multiplet_0").unwrap().is_ok());
        assert!(matches!(
            results.get("multiplet_1").unwrap(),
            Err(SignalError::OutOfRange { .. })
        ));
        // Query points 1.5, 1.6 and 1.7 are all 1.0
        assert!(matches!(
            results.get("multiplet_2").unwrap(),
            Err(SignalError::DegenerateInput(_))
        ));
        assert_eq!(
            results.get("multiplet_3").unwrap().as_ref().unwrap().multiplet_match_idx,
            vec![2]
        );
        assert_eq!(results.matches().count(), 2);
        assert!(results.get("multiplet_4").is_none());
        assert!(results.get("multiplet_03").is_none());
        assert!(results.get("peak_0").is_none());
    }

    #[test]
    fn test_query_override() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);

        let mut overrides = HashMap::new();
        overrides.insert(0, Spectrum::from_pairs([(0.8, 7.0), (0.7, 1.0), (0.6, 2.0)]).unwrap());
        overrides.insert(1, Spectrum::from_pairs([(0.8, 1.0), (0.7, 1.0)]).unwrap());

        let results = do_1d_std_search(
            &query,
            &target,
            &[[0.1, 0.9], [0.7, 1.1]],
            &overrides,
            0.3,
            false,
        );
        let first = results.get_index(0).unwrap().as_ref().unwrap();
        assert_eq!(first.multiplet_len_idx, 3);
        assert_eq!(first.rho_ls.len(), 10);
        assert!((first.multiplet_len_ppm - 0.8).abs() < 1e-9);
        // 7, 1, 2 sits at target ppm 1.0, 0.9, 0.8
        assert_eq!(first.multiplet_match_idx, vec![1]);

        assert!(matches!(
            results.get_index(1).unwrap(),
            Err(SignalError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_floor_window() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);
        let config = SearchConfigBuilder::new()
            .search_region_padding_size(0.3)
            .floor_window(true)
            .build();
        let found = search_multiplet_with(&query, &target, [0.1, 0.9], &config).unwrap();
        // 0.9 and 0.1 sit exactly on grid points, so both ends are kept
        assert_eq!(found.multiplet_len_idx, 9);
        assert_eq!(found.search_start_idx, 17);
        assert_eq!(found.rho_ls.len(), 5);
        assert_eq!(found.multiplet_match_idx, vec![1]);
        assert!((found.rho_ls[1] - 0.99507587).abs() < 1e-6);
    }

    #[test_log::test]
    fn test_region_narrower_than_template() {
        let query_ppm: Vec<f64> = (0..200).map(|i| i as f64 / 100.0).collect();
        let query_intensity: Vec<f64> = query_ppm.iter().map(|p| (p * 7.0).sin()).collect();
        let query = Spectrum::wrap(&query_ppm, &query_intensity).unwrap();
        let target = spectrum_of(&TARGET, false);

        let found = search_multiplet(&query, &target, [0.5, 1.0], 0.1).unwrap();
        assert_eq!(found.multiplet_len_idx, 49);
        assert!(found.rho_ls.is_empty());
        assert!(found.multiplet_match_idx.is_empty());
        assert_eq!(found.best_rho(), None);
    }

    #[test]
    fn test_equal_maxima_are_trimmed() {
        let template = [0.0, 5.0, 0.0];
        let ppm: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut intensity = vec![0.0; 20];
        intensity[4] = 5.0;
        intensity[12] = 5.0;
        let target = Spectrum::wrap(&ppm, &intensity).unwrap();
        let config = SearchConfig::new(0.0, false);

        let found = search_template(&template, &target, [-0.5, 19.5], &config).unwrap();
        assert_eq!(found.multiplet_match_idx, vec![3, 11]);
        assert_eq!(found.multiplet_match_ppm, vec![[-15.0, 5.0], [-7.0, 13.0]]);
    }

    #[test]
    fn test_config_builder() {
        let mut builder = SearchConfigBuilder::new();
        builder.search_region_padding_size(0.25);
        let config = SearchConfig::from(builder);
        assert_eq!(config, SearchConfig::new(0.25, false));
        assert_eq!(SearchConfig::default().search_region_padding_size, 0.0);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serialized_shape() {
        let query = spectrum_of(&QUERY, true);
        let target = spectrum_of(&TARGET, true);
        let results = do_1d_std_search(
            &query,
            &target,
            &[[0.1, 0.9], [50.0, 60.0]],
            &HashMap::new(),
            0.3,
            false,
        );
        let value = serde_json::to_value(&results).unwrap();
        let first = &value["multiplet_0"];
        assert_eq!(first["multiplet_len_idx"], 7);
        assert_eq!(first["multiplet_match_idx"][0], 1);
        assert_eq!(first["rho_ls"].as_array().unwrap().len(), 6);
        assert!(value["multiplet_1"]["error"].is_string());
    }
}

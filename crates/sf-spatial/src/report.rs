//! Decoded spatial report and its derived data.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use sf_core::Domain;
use tracing::warn;

use crate::codec::{self, Header};
use crate::error::{SpatialError, SpatialResult};

/// Options controlling how a report buffer is read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Timestep label of the first stored block.
    pub timestep_offset: i64,
    /// Read only this many timestep blocks (0 = as many as the header says).
    pub timestep_count: u32,
    /// Replacement node ids, one per stored node (empty = use the file's ids).
    pub node_ids: Vec<u32>,
}

impl DecodeOptions {
    pub fn with_offset(mut self, timestep_offset: i64) -> Self {
        self.timestep_offset = timestep_offset;
        self
    }

    pub fn with_timestep_count(mut self, timestep_count: u32) -> Self {
        self.timestep_count = timestep_count;
        self
    }

    pub fn with_node_ids(mut self, node_ids: Vec<u32>) -> Self {
        self.node_ids = node_ids;
        self
    }
}

/// One decoded `SpatialReport_*.bin` file.
///
/// Rows are keyed by timestep label; every row holds one value per entry of
/// [`SpatialBinary::node_ids`], in that order. Per-node timeseries are built
/// on first request and kept for the lifetime of the object.
#[derive(Clone, Debug)]
pub struct SpatialBinary {
    friendly_name: String,
    file_node_ids: Vec<u32>,
    node_ids: Vec<u32>,
    node_index: HashMap<u32, usize>,
    columns: Vec<usize>,
    rows: BTreeMap<i64, Vec<f32>>,
    timestep_domain: Domain<i64>,
    value_domain: Option<Domain<f32>>,
    series_cache: Vec<OnceLock<Vec<f32>>>,
}

impl SpatialBinary {
    /// Create an empty report holding no nodes and no timesteps.
    pub fn new(friendly_name: impl Into<String>) -> Self {
        Self {
            friendly_name: friendly_name.into(),
            file_node_ids: Vec::new(),
            node_ids: Vec::new(),
            node_index: HashMap::new(),
            columns: Vec::new(),
            rows: BTreeMap::new(),
            timestep_domain: Domain::new(0, -1),
            value_domain: None,
            series_cache: Vec::new(),
        }
    }

    /// Create a report and decode `bytes` into it.
    pub fn decode(
        friendly_name: impl Into<String>,
        bytes: &[u8],
        opts: &DecodeOptions,
    ) -> SpatialResult<Self> {
        let mut report = Self::new(friendly_name);
        report.set_data(bytes, opts)?;
        Ok(report)
    }

    /// Decode `bytes`, replacing whatever this report held before.
    ///
    /// On error the report is left exactly as it was. A non-empty
    /// `opts.node_ids` whose length differs from the stored node count is
    /// rejected with [`SpatialError::NodeIdCountMismatch`]. A node id that
    /// appears more than once resolves to its last column everywhere.
    pub fn set_data(&mut self, bytes: &[u8], opts: &DecodeOptions) -> SpatialResult<()> {
        let header = codec::read_header(bytes)?;
        let node_count = header.node_count as usize;

        if !opts.node_ids.is_empty() && opts.node_ids.len() != node_count {
            return Err(SpatialError::NodeIdCountMismatch {
                expected: node_count,
                actual: opts.node_ids.len(),
            });
        }

        let blocks = if opts.timestep_count == 0 {
            header.timestep_count
        } else {
            opts.timestep_count
        };
        let last_label = |count: u32| opts.timestep_offset.checked_add(i64::from(count) - 1);
        let (Some(domain_end), Some(_)) = (last_label(header.timestep_count), last_label(blocks))
        else {
            return Err(SpatialError::TimestepOverflow {
                offset: opts.timestep_offset,
                timesteps: header.timestep_count.max(blocks),
            });
        };
        check_len(bytes, &header, blocks)?;

        let file_node_ids = codec::read_node_ids(bytes, &header);
        let node_ids = if opts.node_ids.is_empty() {
            file_node_ids.clone()
        } else {
            opts.node_ids.clone()
        };

        let mut node_index = HashMap::with_capacity(node_count);
        for (i, id) in node_ids.iter().enumerate() {
            node_index.insert(*id, i);
        }
        let mut columns: Vec<usize> = node_index.values().copied().collect();
        columns.sort_unstable();

        let mut rows = BTreeMap::new();
        let mut value_domain: Option<Domain<f32>> = None;
        for block in 0..blocks as usize {
            let row = codec::read_row(bytes, &header, block);
            for value in columns.iter().map(|&c| row[c]) {
                match value_domain.as_mut() {
                    Some(domain) => domain.include(value),
                    None => value_domain = Some(Domain::new(value, value)),
                }
            }
            rows.insert(opts.timestep_offset + block as i64, row);
        }

        // The domain follows the header's count even when fewer blocks were read.
        let timestep_domain = Domain::new(opts.timestep_offset, domain_end);

        self.series_cache = (0..node_ids.len()).map(|_| OnceLock::new()).collect();
        self.file_node_ids = file_node_ids;
        self.node_ids = node_ids;
        self.node_index = node_index;
        self.columns = columns;
        self.rows = rows;
        self.timestep_domain = timestep_domain;
        self.value_domain = value_domain;
        Ok(())
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Node ids used to label values (overrides if any were supplied).
    pub fn node_ids(&self) -> &[u32] {
        &self.node_ids
    }

    /// Node ids exactly as stored in the file.
    pub fn file_node_ids(&self) -> &[u32] {
        &self.file_node_ids
    }

    pub fn timestep_domain(&self) -> Domain<i64> {
        self.timestep_domain
    }

    /// `[min, max]` over every decoded value, `None` if nothing was decoded.
    pub fn value_domain(&self) -> Option<Domain<f32>> {
        self.value_domain
    }

    /// Number of decoded timestep rows.
    pub fn timestep_count(&self) -> usize {
        self.rows.len()
    }

    /// Value of one node at one timestep.
    ///
    /// Unknown nodes and timesteps outside the domain yield `NaN`.
    pub fn value_at(&self, node_id: u32, timestep: i64) -> f32 {
        let Some(&column) = self.node_index.get(&node_id) else {
            warn!(report = %self.friendly_name, node_id, "invalid node id");
            return f32::NAN;
        };
        if !self.timestep_domain.contains(timestep) {
            warn!(
                report = %self.friendly_name,
                timestep,
                domain = %self.timestep_domain,
                "timestep outside report domain"
            );
            return f32::NAN;
        }
        match self.rows.get(&timestep) {
            Some(row) => row[column],
            None => {
                warn!(report = %self.friendly_name, timestep, "timestep was not decoded");
                f32::NAN
            }
        }
    }

    /// Sum over all nodes at one timestep, `NaN` if the timestep has no data.
    pub fn sum_at(&self, timestep: i64) -> f64 {
        match self.rows.get(&timestep) {
            Some(row) => self.row_sum(row),
            None => {
                warn!(report = %self.friendly_name, timestep, "no data at timestep");
                f64::NAN
            }
        }
    }

    /// One value per decoded timestep, ascending, for `node_id`.
    ///
    /// Empty if the node is unknown.
    pub fn timeseries_for_node(&self, node_id: u32) -> &[f32] {
        let Some(&column) = self.node_index.get(&node_id) else {
            return &[];
        };
        self.series_cache[column].get_or_init(|| self.rows.values().map(|row| row[column]).collect())
    }

    /// Values of every node at `timestep`, empty outside the domain.
    pub fn values_at_timestep(&self, timestep: i64) -> BTreeMap<u32, f32> {
        if !self.timestep_domain.contains(timestep) {
            return BTreeMap::new();
        }
        match self.rows.get(&timestep) {
            Some(row) => self
                .node_index
                .iter()
                .map(|(&id, &column)| (id, row[column]))
                .collect(),
            None => BTreeMap::new(),
        }
    }

    /// One sum over all nodes per decoded timestep, ascending.
    pub fn sum_timeseries(&self) -> Vec<f64> {
        self.rows.values().map(|row| self.row_sum(row)).collect()
    }

    /// `[min, max]` of [`SpatialBinary::sum_timeseries`], `None` without timesteps.
    pub fn summed_domain(&self) -> Option<Domain<f64>> {
        Domain::spanning(self.sum_timeseries())
    }

    fn row_sum(&self, row: &[f32]) -> f64 {
        self.columns.iter().map(|&c| f64::from(row[c])).sum()
    }
}

fn check_len(bytes: &[u8], header: &Header, blocks: u32) -> SpatialResult<()> {
    let needed = header.required_len(blocks).unwrap_or(u64::MAX);
    if (bytes.len() as u64) < needed {
        return Err(SpatialError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Human-readable channel name for a spatial report path.
///
/// `output/SpatialReport_Daily_EIR.bin` becomes `Daily EIR`.
pub fn channel_name(path: &str) -> String {
    const MARKER: &str = "SpatialReport_";
    let label = match path.find(MARKER) {
        Some(idx) => &path[idx + MARKER.len()..],
        None => path,
    };
    let label = label.strip_suffix(".bin").unwrap_or(label);
    label.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn scenario_b() -> Vec<u8> {
        encode(&[10, 20], &[[1.0_f32, 2.0], [3.0, 4.0], [5.0, 6.0]])
    }

    #[test]
    fn decodes_columns_per_node() {
        let sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        assert_eq!(sb.node_ids(), &[10, 20]);
        assert_eq!(sb.timeseries_for_node(10), &[1.0, 3.0, 5.0]);
        assert_eq!(sb.timeseries_for_node(20), &[2.0, 4.0, 6.0]);
        assert_eq!(sb.value_domain(), Some(Domain::new(1.0, 6.0)));
        assert_eq!(sb.timestep_domain(), Domain::new(0, 2));
        assert_eq!(sb.timestep_count(), 3);
    }

    #[test]
    fn timeseries_is_memoized() {
        let sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        let first = sb.timeseries_for_node(10).as_ptr();
        let second = sb.timeseries_for_node(10).as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_override_ids_leave_report_untouched() {
        let mut sb = SpatialBinary::new("c");
        let opts = DecodeOptions::default().with_node_ids(vec![1, 2, 3]);
        let err = sb.set_data(&scenario_b(), &opts).unwrap_err();
        assert_eq!(
            err,
            SpatialError::NodeIdCountMismatch {
                expected: 2,
                actual: 3
            }
        );
        assert!(sb.node_ids().is_empty());
        assert_eq!(sb.timestep_count(), 0);
        assert!(sb.value_domain().is_none());
    }

    #[test]
    fn failed_redecode_keeps_prior_state() {
        let mut sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        let truncated = &scenario_b()[..20];
        assert!(sb.set_data(truncated, &DecodeOptions::default()).is_err());
        assert_eq!(sb.timeseries_for_node(20), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn override_ids_relabel_nodes() {
        let opts = DecodeOptions::default().with_node_ids(vec![100, 200]);
        let sb = SpatialBinary::decode("b", &scenario_b(), &opts).unwrap();
        assert_eq!(sb.node_ids(), &[100, 200]);
        assert_eq!(sb.file_node_ids(), &[10, 20]);
        assert_eq!(sb.value_at(200, 1), 4.0);
        assert!(sb.timeseries_for_node(10).is_empty());
    }

    #[test]
    fn offset_and_truncated_count() {
        let opts = DecodeOptions::default()
            .with_offset(5)
            .with_timestep_count(2);
        let sb = SpatialBinary::decode("b", &scenario_b(), &opts).unwrap();
        assert_eq!(sb.timestep_count(), 2);
        // Domain still spans the header's three timesteps.
        assert_eq!(sb.timestep_domain(), Domain::new(5, 7));
        assert_eq!(sb.value_at(10, 6), 3.0);
        assert!(sb.value_at(10, 7).is_nan());
        assert_eq!(sb.timeseries_for_node(20), &[2.0, 4.0]);
        assert_eq!(sb.value_domain(), Some(Domain::new(1.0, 4.0)));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = scenario_b();
        bytes.extend_from_slice(&[0xff; 12]);
        let sb = SpatialBinary::decode("b", &bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(sb.sum_timeseries(), vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn truncated_table_is_an_error() {
        let bytes = scenario_b();
        let err = SpatialBinary::decode("b", &bytes[..bytes.len() - 1], &DecodeOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            SpatialError::Truncated {
                needed: 40,
                actual: 39
            }
        );
    }

    #[test]
    fn out_of_range_lookups_are_nan_or_empty() {
        let sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        assert!(sb.value_at(99, 0).is_nan());
        assert!(sb.value_at(10, 3).is_nan());
        assert!(sb.value_at(10, -1).is_nan());
        assert!(sb.sum_at(3).is_nan());
        assert!(sb.values_at_timestep(3).is_empty());
        assert!(sb.timeseries_for_node(99).is_empty());
    }

    #[test]
    fn sums_and_summed_domain() {
        let sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        assert_eq!(sb.sum_at(0), 3.0);
        assert_eq!(sb.summed_domain(), Some(Domain::new(3.0, 11.0)));
        let at1 = sb.values_at_timestep(1);
        assert_eq!(at1.get(&10), Some(&3.0));
        assert_eq!(at1.get(&20), Some(&4.0));
    }

    #[test]
    fn empty_report_has_no_summed_domain() {
        let bytes = encode::<[f32; 2]>(&[1, 2], &[]);
        let sb = SpatialBinary::decode("e", &bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(sb.timestep_count(), 0);
        assert!(sb.timestep_domain().is_empty());
        assert!(sb.summed_domain().is_none());
        assert!(sb.value_domain().is_none());
    }

    #[test]
    fn oversized_header_is_truncated() {
        let mut bytes = vec![0xff; 8];
        bytes.extend_from_slice(&[0; 8]);
        let err = SpatialBinary::decode("huge", &bytes, &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err,
            SpatialError::Truncated {
                needed: u64::MAX,
                actual: 16
            }
        );
    }

    #[test]
    fn repeated_node_id_resolves_to_last_column() {
        let bytes = encode(&[7, 7], &[[1.0_f32, 2.0], [3.0, 4.0]]);
        let sb = SpatialBinary::decode("dup", &bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(sb.value_at(7, 0), 2.0);
        assert_eq!(sb.values_at_timestep(0).get(&7), Some(&2.0));
        assert_eq!(sb.timeseries_for_node(7), &[2.0, 4.0]);
        assert_eq!(sb.sum_at(0), 2.0);
        assert_eq!(sb.sum_timeseries(), vec![2.0, 4.0]);
        assert_eq!(sb.value_domain(), Some(Domain::new(2.0, 4.0)));
    }

    #[test]
    fn repeated_override_id_resolves_to_last_column() {
        let opts = DecodeOptions::default().with_node_ids(vec![5, 5]);
        let sb = SpatialBinary::decode("b", &scenario_b(), &opts).unwrap();
        for timestep in 0..3 {
            let at = sb.values_at_timestep(timestep);
            assert_eq!(at.len(), 1);
            assert_eq!(at.get(&5), Some(&sb.value_at(5, timestep)));
            assert_eq!(sb.sum_at(timestep), f64::from(sb.value_at(5, timestep)));
        }
        assert_eq!(sb.timeseries_for_node(5), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn overflowing_offset_is_rejected() {
        let mut sb = SpatialBinary::decode("b", &scenario_b(), &DecodeOptions::default()).unwrap();
        let opts = DecodeOptions::default().with_offset(i64::MAX);
        let err = sb.set_data(&scenario_b(), &opts).unwrap_err();
        assert_eq!(
            err,
            SpatialError::TimestepOverflow {
                offset: i64::MAX,
                timesteps: 3
            }
        );
        assert_eq!(sb.timestep_domain(), Domain::new(0, 2));
        assert_eq!(sb.timeseries_for_node(10), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn empty_report_below_smallest_label_is_rejected() {
        let bytes = encode::<[f32; 1]>(&[1], &[]);
        let opts = DecodeOptions::default().with_offset(i64::MIN);
        let err = SpatialBinary::decode("e", &bytes, &opts).unwrap_err();
        assert_eq!(
            err,
            SpatialError::TimestepOverflow {
                offset: i64::MIN,
                timesteps: 0
            }
        );
    }

    #[test]
    fn largest_fitting_offset_is_accepted() {
        let opts = DecodeOptions::default().with_offset(i64::MAX - 2);
        let sb = SpatialBinary::decode("b", &scenario_b(), &opts).unwrap();
        assert_eq!(sb.timestep_domain(), Domain::new(i64::MAX - 2, i64::MAX));
        assert_eq!(sb.value_at(20, i64::MAX), 6.0);
    }

    #[test]
    fn channel_names() {
        assert_eq!(channel_name("output/SpatialReport_Daily_EIR.bin"), "Daily EIR");
        assert_eq!(channel_name("output/SpatialReport_Population.bin"), "Population");
        assert_eq!(channel_name("plain.bin"), "plain");
    }
}

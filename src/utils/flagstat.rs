/// Parsing of `samtools flagstat` textual reports into alignment statistics.
///
/// The report shape is fixed: each counter sits on a known line, and every
/// counted line starts with "A + B" (QC-passed count + QC-failed count). The
/// fields of interest are described by a small table carrying both the line
/// index and a recognizable label, so the positional contract stays the
/// default while a label-based lookup is available for reports that shift.
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::config::defs::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentStats {
    pub total_reads: u64,
    pub mapped_reads: u64,
    pub unmapped_reads: u64,
    /// Percent of total records mapped, in [0, 100].
    pub alignment_rate: f64,
    pub properly_paired: u64,
    pub singletons: u64,
    /// Not derivable from flagstat output; always 0.
    pub multiple_alignments: u64,
}

/// How a field's report line is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMatchStrategy {
    /// Fixed line position, the historical flagstat contract.
    FixedIndex,
    /// First line containing the field's label. Tolerant of inserted lines.
    Label,
}

struct FlagstatField {
    name: &'static str,
    index: usize,
    label: &'static str,
}

const TOTAL: FlagstatField = FlagstatField {
    name: "total",
    index: 0,
    label: "in total",
};
const MAPPED: FlagstatField = FlagstatField {
    name: "mapped",
    index: 4,
    label: "mapped (",
};
const PROPERLY_PAIRED: FlagstatField = FlagstatField {
    name: "properly paired",
    index: 8,
    label: "properly paired",
};
const SINGLETONS: FlagstatField = FlagstatField {
    name: "singletons",
    index: 10,
    label: "singletons",
};

lazy_static! {
    static ref TWO_NUMS: Regex = Regex::new(r"^(\d+) \+ (\d+)").unwrap();
}

/// Pulls the leading "A + B" pair off a field's line, or fails with
/// `MalformedReport` naming the field.
fn field_counts(
    lines: &[&str],
    field: &FlagstatField,
    strategy: LineMatchStrategy,
) -> Result<(u64, u64), PipelineError> {
    let line = match strategy {
        LineMatchStrategy::FixedIndex => lines.get(field.index).copied(),
        LineMatchStrategy::Label => lines
            .iter()
            .copied()
            .find(|line| line.contains(field.label)),
    };
    let line = line.ok_or_else(|| PipelineError::MalformedReport {
        field: field.name,
        index: field.index,
        detail: "line missing from report".to_string(),
    })?;

    let caps = TWO_NUMS
        .captures(line)
        .ok_or_else(|| PipelineError::MalformedReport {
            field: field.name,
            index: field.index,
            detail: format!("expected leading 'A + B' counts, got: {}", line),
        })?;

    // The regex guarantees both groups are digit runs.
    let a = caps[1].parse::<u64>().map_err(|e| PipelineError::MalformedReport {
        field: field.name,
        index: field.index,
        detail: e.to_string(),
    })?;
    let b = caps[2].parse::<u64>().map_err(|e| PipelineError::MalformedReport {
        field: field.name,
        index: field.index,
        detail: e.to_string(),
    })?;
    Ok((a, b))
}

/// Parses a flagstat report using the historical fixed-line positions.
pub fn parse_flagstat(report: &str) -> Result<AlignmentStats, PipelineError> {
    parse_flagstat_with(report, LineMatchStrategy::FixedIndex)
}

/// Parses a flagstat report with an explicit line-matching strategy.
pub fn parse_flagstat_with(
    report: &str,
    strategy: LineMatchStrategy,
) -> Result<AlignmentStats, PipelineError> {
    let lines: Vec<&str> = report.lines().collect();

    let (total_pass, total_fail) = field_counts(&lines, &TOTAL, strategy)?;
    let total_reads = total_pass + total_fail;

    // Mapped counts QC-passed records only.
    let (mapped_reads, _) = field_counts(&lines, &MAPPED, strategy)?;
    let unmapped_reads = total_reads.saturating_sub(mapped_reads);

    let alignment_rate = if total_reads == 0 {
        warn!(
            "alignment stats don't look right: total QC-passed + QC-failed = 0; \
             setting alignment_rate = 0"
        );
        0.0
    } else {
        let rate = mapped_reads as f64 / total_reads as f64 * 100.0;
        // Numeric-noise guard.
        if rate > 100.0 { 100.0 } else { rate }
    };

    let (properly_paired, _) = field_counts(&lines, &PROPERLY_PAIRED, strategy)?;
    let (singletons, _) = field_counts(&lines, &SINGLETONS, strategy)?;

    Ok(AlignmentStats {
        total_reads,
        mapped_reads,
        unmapped_reads,
        alignment_rate,
        properly_paired,
        singletons,
        multiple_alignments: 0,
    })
}

use anyhow::{Result, bail};

use traj_stitch::{Framing, NanPolicy, OverflowPolicy, RetentionPolicy, RunOrder};

use crate::cli::{FramingArg, NanPolicyArg, OverflowArg, RetentionArg, RunOrderArg};

impl From<RunOrderArg> for RunOrder {
    fn from(arg: RunOrderArg) -> Self {
        match arg {
            RunOrderArg::Name => RunOrder::Name,
            RunOrderArg::Modified => RunOrder::Modified,
        }
    }
}

impl From<RetentionArg> for RetentionPolicy {
    fn from(arg: RetentionArg) -> Self {
        match arg {
            RetentionArg::KeepAll => RetentionPolicy::KeepAll,
            RetentionArg::KeepNewest => RetentionPolicy::KeepNewest,
        }
    }
}

impl From<NanPolicyArg> for NanPolicy {
    fn from(arg: NanPolicyArg) -> Self {
        match arg {
            NanPolicyArg::Keep => NanPolicy::Keep,
            NanPolicyArg::Drop => NanPolicy::Drop,
        }
    }
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Flat => Framing::Flat,
            FramingArg::MultiModel => Framing::MultiModel,
            FramingArg::PerFrame => Framing::PerFrame,
        }
    }
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Fail => OverflowPolicy::Fail,
            OverflowArg::Truncate => OverflowPolicy::Truncate,
        }
    }
}

pub fn framing_name(framing: Framing) -> &'static str {
    match framing {
        Framing::Flat => "flat",
        Framing::MultiModel => "multi-model",
        Framing::PerFrame => "per-frame",
    }
}

/// Expands a residue list such as `"1-4,6,8-10"` into its numbers.
pub fn parse_residue_list(list: &str) -> Result<Vec<i32>> {
    let mut residues = Vec::new();

    for segment in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match split_range(segment) {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.parse::<i32>(), end.parse::<i32>()) else {
                    bail!("Invalid residue range '{}' in '{}'", segment, list);
                };
                if start > end {
                    bail!("Residue range '{}' runs backwards", segment);
                }
                residues.extend(start..=end);
            }
            None => match segment.parse::<i32>() {
                Ok(n) => residues.push(n),
                Err(_) => bail!("Invalid residue number '{}' in '{}'", segment, list),
            },
        }
    }

    if residues.is_empty() {
        bail!("Residue list '{}' is empty", list);
    }
    Ok(residues)
}

// A leading '-' belongs to the first number.
fn split_range(segment: &str) -> Option<(&str, &str)> {
    let offset = usize::from(segment.starts_with('-'));
    segment[offset..]
        .find('-')
        .map(|i| (&segment[..offset + i], &segment[offset + i + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges_and_singles() {
        assert_eq!(
            parse_residue_list("1-4,6,8-10").unwrap(),
            vec![1, 2, 3, 4, 6, 8, 9, 10]
        );
        assert_eq!(parse_residue_list("1-3").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn accepts_negative_numbers() {
        assert_eq!(parse_residue_list("-2--1, 3").unwrap(), vec![-2, -1, 3]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_residue_list("a-3").is_err());
        assert!(parse_residue_list("5-2").is_err());
        assert!(parse_residue_list(",").is_err());
    }
}

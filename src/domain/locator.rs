// Nearest sample lookup for the hover legend
use super::series::Sample;

/// Binary search stops narrowing once the window is smaller than this
const LINEAR_SCAN_WINDOW: isize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSample {
    pub index: usize,
    pub time_ms: i64,
    pub value: f64,
}

/// Locate the first sample at or after `time_ms` in an ascending sequence.
///
/// A coarse binary search narrows the range to fewer than 32 indexes, then a forward scan
/// stops at the first sample not before `time_ms` or at the upper bound of the range.
/// Past the last sample the upper bound is returned. When the search discards the exact
/// match at its last halving step, the sample just before it is returned; the legend
/// relies on this behaviour, so it is kept.
pub fn locate_nearest(samples: &[Sample], time_ms: i64) -> Option<NearestSample> {
    if samples.is_empty() {
        return None;
    }

    let mut imin: isize = 0;
    let mut imax: isize = samples.len() as isize - 1;
    while imax - imin >= LINEAR_SCAN_WINDOW {
        let imid = (imax - imin) / 2 + imin;
        if samples[imid as usize].time_ms < time_ms {
            imin = imid + 1;
        } else {
            imax = imid - 1;
        }
    }

    let mut j = imin;
    while j < imax && samples[j as usize].time_ms < time_ms {
        j += 1;
    }

    let sample = samples[j as usize];
    Some(NearestSample {
        index: j as usize,
        time_ms: sample.time_ms,
        value: sample.value,
    })
}

//! Locating a trigger template inside a captured frame.
//!
//! The matcher evaluates every placement of the template (no pyramid, no
//! rotation) and reports the global maximum. Ties resolve to the first
//! placement in row-major order, top-left to bottom-right, for both the
//! scalar and the parallel kernel.

use crate::frame::{Frame, Point, Size};
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{Kernel, Peak};
use crate::template::TemplatePlan;
use crate::trace::trace_event;
use crate::util::TriggerResult;

/// Scores at or above this value are actionable.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Best placement of a template in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    /// ZNCC score in `[-1, 1]`.
    pub confidence: f32,
    /// Offset of the template's top-left corner within the frame.
    pub top_left: Point,
    /// Template dimensions.
    pub template_size: Size,
}

impl MatchResult {
    fn from_peak(peak: Peak, template_size: Size) -> Self {
        Self {
            confidence: peak.score,
            top_left: Point::new(peak.x as i32, peak.y as i32),
            template_size,
        }
    }

    /// Returns the match center, rounding half sizes down.
    pub fn center(&self) -> Point {
        self.top_left.offset(
            (self.template_size.width / 2) as i32,
            (self.template_size.height / 2) as i32,
        )
    }

    /// Returns true when the confidence reaches `threshold`.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

/// Template matcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct Matcher {
    parallel: bool,
}

impl Matcher {
    /// Creates a sequential matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables row-parallel scanning. Ignored without the `rayon` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns whether parallel scanning was requested.
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Matches a precomputed template plan against `frame`.
    ///
    /// Fails with `TemplateLargerThanFrame` if the template does not fit.
    pub fn match_plan(&self, frame: &Frame, plan: &TemplatePlan) -> TriggerResult<MatchResult> {
        let peak = self.scan(frame, plan)?;
        trace_event!("match", x = peak.x, y = peak.y, score = peak.score);
        Ok(MatchResult::from_peak(peak, plan.size()))
    }

    /// Matches a template frame against `frame`.
    pub fn match_template(&self, frame: &Frame, template: &Frame) -> TriggerResult<MatchResult> {
        let plan = TemplatePlan::from_frame(template)?;
        self.match_plan(frame, &plan)
    }

    #[cfg(feature = "rayon")]
    fn scan(&self, frame: &Frame, plan: &TemplatePlan) -> TriggerResult<Peak> {
        if self.parallel {
            crate::kernel::rayon::zncc_scan_full_par(frame, plan)
        } else {
            ZnccScalar::scan_full(frame, plan)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn scan(&self, frame: &Frame, plan: &TemplatePlan) -> TriggerResult<Peak> {
        ZnccScalar::scan_full(frame, plan)
    }
}

/// Matches `template` against `frame` with the sequential kernel.
pub fn match_template(frame: &Frame, template: &Frame) -> TriggerResult<MatchResult> {
    Matcher::new().match_template(frame, template)
}

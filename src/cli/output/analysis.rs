use std::collections::HashMap;

use chrono::Duration;

use crate::{
    classification::{Category, ClassifiedSample, UrlParts},
    utils::percentage::Percentage,
};

/// Time spent on one app or site, split by the category it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    /// Domain for samples decided by a url rule, process name otherwise.
    pub name: String,
    pub category: Category,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryUsage {
    pub productive: Duration,
    pub neutral: Duration,
    pub unproductive: Duration,
}

impl Default for CategoryUsage {
    fn default() -> Self {
        Self {
            productive: Duration::zero(),
            neutral: Duration::zero(),
            unproductive: Duration::zero(),
        }
    }
}

impl CategoryUsage {
    pub fn total(&self) -> Duration {
        self.productive + self.neutral + self.unproductive
    }

    fn slot(&mut self, category: Category) -> &mut Duration {
        match category {
            Category::Productive => &mut self.productive,
            Category::Neutral => &mut self.neutral,
            Category::Unproductive => &mut self.unproductive,
        }
    }
}

/// Pairs every sample with the time it covers: the gap to the next sample, capped at
/// `idle_gap`. The last sample covers nothing, there is no telling how long it lasted.
pub fn sample_durations(
    samples: &[ClassifiedSample],
    idle_gap: Duration,
) -> impl Iterator<Item = (&ClassifiedSample, Duration)> {
    samples.iter().enumerate().map(move |(index, sample)| {
        let covered = samples
            .get(index + 1)
            .map(|next| {
                let gap = next.timestamp_ms().saturating_sub(sample.timestamp_ms());
                i64::try_from(gap)
                    .ok()
                    .and_then(Duration::try_milliseconds)
                    .map_or(idle_gap, |gap| gap.min(idle_gap))
            })
            .unwrap_or_else(Duration::zero);
        (sample, covered)
    })
}

fn usage_name(sample: &ClassifiedSample) -> String {
    if sample.is_url_override() {
        if let Some(parts) = sample.sample.url.as_deref().and_then(UrlParts::parse) {
            return parts.domain;
        }
    }
    sample.sample.process_name().to_string()
}

/// Returns apps and sites sorted by time spent, plus the total tracked time. Entries that
/// take no more than `min_percentage` of the total are dropped.
pub fn analyze_usage(
    samples: &[ClassifiedSample],
    idle_gap: Duration,
    min_percentage: Percentage,
) -> (Vec<UsageEntry>, Duration) {
    let mut map = HashMap::<(String, Category), UsageEntry>::new();
    let mut total = Duration::zero();

    for (sample, duration) in sample_durations(samples, idle_gap) {
        total += duration;
        let name = usage_name(sample);
        let entry = map
            .entry((name.to_lowercase(), sample.category))
            .or_insert_with(|| UsageEntry {
                name,
                category: sample.category,
                duration: Duration::zero(),
            });
        entry.duration += duration;
    }

    let threshold = Duration::milliseconds(
        (total.num_milliseconds() as f64 * *min_percentage / 100.) as i64,
    );

    let mut usages = map
        .into_values()
        .filter(|v| v.duration > threshold)
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| b.duration.cmp(&a.duration).then_with(|| a.name.cmp(&b.name)));
    (usages, total)
}

pub fn analyze_categories(samples: &[ClassifiedSample], idle_gap: Duration) -> CategoryUsage {
    let mut usage = CategoryUsage::default();
    for (sample, duration) in sample_durations(samples, idle_gap) {
        *usage.slot(sample.category) += duration;
    }
    usage
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::{
        classification::{ActivitySample, Category, ClassificationSource, ClassifiedSample},
        utils::percentage::Percentage,
    };

    use super::{analyze_categories, analyze_usage, sample_durations};

    fn classified(
        sample: ActivitySample,
        category: Category,
        source: ClassificationSource,
    ) -> ClassifiedSample {
        ClassifiedSample {
            weight: category.default_weight(),
            sample,
            category,
            source,
        }
    }

    fn samples() -> Vec<ClassifiedSample> {
        use ClassificationSource::*;
        vec![
            classified(
                ActivitySample::new("/usr/bin/code", "a.rs", 0),
                Category::Productive,
                App,
            ),
            classified(
                ActivitySample::new("/usr/bin/code", "b.rs", 60_000),
                Category::Productive,
                App,
            ),
            classified(
                ActivitySample::new("firefox", "", 120_000)
                    .with_url("https://www.reddit.com/r/all"),
                Category::Unproductive,
                Url,
            ),
            // user went away for an hour
            classified(
                ActivitySample::new("code", "", 150_000),
                Category::Productive,
                App,
            ),
            classified(
                ActivitySample::new("mystery", "", 3_750_000),
                Category::Neutral,
                Default,
            ),
        ]
    }

    fn no_filter() -> Percentage {
        Percentage::new_opt(0.).unwrap()
    }

    #[test]
    fn durations_are_capped_by_idle_gap() {
        let samples = samples();
        let durations = sample_durations(&samples, Duration::minutes(2))
            .map(|(_, d)| d.num_seconds())
            .collect::<Vec<_>>();
        assert_eq!(durations, vec![60, 60, 30, 120, 0]);
    }

    #[test]
    fn huge_gaps_are_capped_by_idle_gap() {
        let samples = vec![
            classified(
                ActivitySample::new("code", "", 0),
                Category::Productive,
                ClassificationSource::App,
            ),
            classified(
                ActivitySample::new("code", "", u64::MAX),
                Category::Productive,
                ClassificationSource::App,
            ),
        ];
        let durations = sample_durations(&samples, Duration::minutes(2))
            .map(|(_, d)| d)
            .collect::<Vec<_>>();
        assert_eq!(durations, vec![Duration::minutes(2), Duration::zero()]);
    }

    #[test]
    fn usage_is_grouped_by_name_and_category() {
        let (usage, total) = analyze_usage(&samples(), Duration::minutes(2), no_filter());
        assert_eq!(total, Duration::seconds(270));
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].name, "code");
        assert_eq!(usage[0].duration, Duration::seconds(240));
        assert_eq!(usage[1].name, "reddit.com");
        assert_eq!(usage[1].category, Category::Unproductive);
    }

    #[test]
    fn small_entries_are_filtered() {
        let min_percentage = Percentage::new_opt(20.).unwrap();
        let (usage, _) = analyze_usage(&samples(), Duration::minutes(2), min_percentage);
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn categories_add_up() {
        let usage = analyze_categories(&samples(), Duration::minutes(2));
        assert_eq!(usage.productive, Duration::seconds(240));
        assert_eq!(usage.unproductive, Duration::seconds(30));
        assert_eq!(usage.neutral, Duration::zero());
        assert_eq!(usage.total(), Duration::seconds(270));
    }
}

//! 评估分数统计

use crate::models::evaluation::EvaluationRecord;

/// 一组评估记录的统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreStats {
    pub total: usize,
    /// 有分数的单词数
    pub scored: usize,
    /// 分数为 `null` 的单词数
    pub unknown: usize,
    /// 分数低于 `low_threshold` 的单词数
    pub below: usize,
    pub low_threshold: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// 样本标准差；只有一个分数时为 0.0，没有分数时为 `None`
    pub stdev: Option<f64>,
}

impl ScoreStats {
    pub fn from_records<'a, I>(records: I, low_threshold: f64) -> Self
    where
        I: IntoIterator<Item = &'a EvaluationRecord>,
    {
        let mut total = 0;
        let mut scores = Vec::new();
        for record in records {
            total += 1;
            if let Some(score) = record.score {
                scores.push(score);
            }
        }
        scores.sort_by(f64::total_cmp);

        let scored = scores.len();
        let mean = (scored > 0).then(|| scores.iter().sum::<f64>() / scored as f64);
        let median = match scored {
            0 => None,
            n if n % 2 == 1 => Some(scores[n / 2]),
            n => Some((scores[n / 2 - 1] + scores[n / 2]) / 2.0),
        };
        let stdev = mean.map(|m| {
            if scored < 2 {
                return 0.0;
            }
            let variance = scores.iter().map(|s| (s - m).powi(2)).sum::<f64>() / (scored - 1) as f64;
            variance.sqrt()
        });

        Self {
            total,
            scored,
            unknown: total - scored,
            below: scores.iter().filter(|s| **s < low_threshold).count(),
            low_threshold,
            mean,
            median,
            min: scores.first().copied(),
            max: scores.last().copied(),
            stdev,
        }
    }

    /// 低分单词占有分数单词的百分比
    pub fn below_percent(&self) -> f64 {
        if self.scored == 0 {
            0.0
        } else {
            self.below as f64 * 100.0 / self.scored as f64
        }
    }
}

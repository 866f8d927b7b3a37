//! 递归合取过滤器
//! 将规则顶层条件与嵌套子条件合取为一次过滤，基底限定在尚未标注的行

use crate::dataset::Dataset;
use crate::engine::predicate::PredicateEvaluator;
use crate::error::RslResult;
use crate::rule::model::Condition;

/// 合取过滤器
/// 纯递归实现：对不可变子条件切片递归，不消耗调用方的条件列表，
/// 同一规则可重复参与多次过滤
#[derive(Debug, Default)]
pub struct ConjunctiveFilter;

impl ConjunctiveFilter {
    /// 求规则条件与全部子条件的合取命中集
    /// 递归基底（子条件耗尽）先把候选限定为 label 仍为默认值的行，
    /// 再逐层回溯收窄——后层规则永远看不到已被认领的行
    pub fn resolve(
        dataset: &Dataset,
        condition: &Condition,
        children: &[Condition],
    ) -> RslResult<Vec<usize>> {
        match children.split_first() {
            None => {
                let unassigned = dataset.unassigned_rows();
                PredicateEvaluator::eval(dataset, &unassigned, condition)
            }
            Some((next, rest)) => {
                let narrowed = Self::resolve(dataset, next, rest)?;
                PredicateEvaluator::eval(dataset, &narrowed, condition)
            }
        }
    }
}

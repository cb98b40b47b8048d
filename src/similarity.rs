use crate::error::SearchError;
use crate::orb::Descriptor;

/// 计算两个描述符的余弦相似度，放大到 0 ~ 100
///
/// 任意一个向量为零向量时，余弦相似度没有定义，此时返回 0。
/// 负相关的结果截断为 0。
pub fn cosine_similarity(a: &Descriptor, b: &Descriptor) -> Result<f32, SearchError> {
    if a.len() != b.len() {
        return Err(SearchError::DescriptorLengthMismatch { left: a.len(), right: b.len() });
    }

    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0. || norm_b == 0. {
        return Ok(0.);
    }

    let cos = a.dot(b) / (norm_a * norm_b);
    Ok((cos * 100.).clamp(0., 100.))
}

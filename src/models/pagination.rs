use serde::Serialize;

/// 페이지 번호 링크 하나 (표시는 1부터, href의 page 파라미터는 0부터)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLink {
    /// 1-based 표시용 라벨
    pub text: String,
    pub href: String,
    /// 현재 페이지인 경우에만 true
    pub selected: bool,
}

/// 이전/다음 이동 링크
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNav {
    pub href: String,
}

/// 결과 요약: "Showing {from} to {to} of {count} results"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub from: u64,
    pub to: u64,
    pub count: u64,
}

/// 요청마다 새로 계산되는 페이지 윈도우 뷰 모델 (최대 10개 링크)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationWindow {
    pub items: Vec<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageNav>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageNav>,
    pub results: ResultsSummary,
}

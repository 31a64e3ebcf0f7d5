//! # 페이지 윈도우 계산기
//!
//! 전체 결과 수, 현재 페이지(0부터), 페이지 크기, 기준 URL에서
//! 최대 10개의 페이지 링크 윈도우를 계산하는 순수 함수입니다.
//! 아무것도 저장하지 않고 요청마다 새로 계산됩니다.
//!
//! href는 기준 URL의 `page` 쿼리 파라미터를 0-based 숫자 값으로
//! 치환해 만듭니다. 다른 쿼리 파라미터는 그대로 보존됩니다.

use url::Url;

use crate::models::{PageLink, PageNav, PaginationWindow, ResultsSummary};

/// 페이지 윈도우를 계산합니다. `current_page`는 0부터 셉니다.
pub fn paginate(
    total_results: u64,
    current_page: u64,
    limit: u64,
    base_url: &Url,
) -> PaginationWindow {
    let number_of_pages = if limit == 0 {
        0
    } else {
        total_results.div_ceil(limit)
    };

    // 페이지가 하나 이하면 윈도우도 이동 링크도 없고 요약만 남습니다
    let (items, previous, next) = if number_of_pages <= 1 {
        (Vec::new(), None, None)
    } else {
        let (from, to) = window_bounds(number_of_pages, current_page);

        let items = (from..to)
            .map(|index| PageLink {
                text: (index + 1).to_string(), // 표시용 라벨은 1부터
                href: with_page(base_url, index),
                selected: index == current_page,
            })
            .collect();

        let previous = PageNav {
            href: with_page(base_url, current_page.saturating_sub(1)),
        };
        // 마지막 페이지에서는 next가 자기 자신을 가리킵니다
        let next_page = if current_page.saturating_add(1) >= number_of_pages {
            current_page
        } else {
            current_page + 1
        };
        let next = PageNav {
            href: with_page(base_url, next_page),
        };

        (items, Some(previous), Some(next))
    };

    // 페이지 번호는 쿼리 파라미터에서 그대로 들어오므로
    // 터무니없는 값에도 패닉 없이 포화 연산합니다.
    let is_last_page = number_of_pages <= 1 || current_page.saturating_add(1) >= number_of_pages;
    let results = ResultsSummary {
        from: current_page.saturating_mul(limit).saturating_add(1),
        to: if is_last_page {
            total_results
        } else {
            current_page.saturating_add(1).saturating_mul(limit)
        },
        count: total_results,
    };

    PaginationWindow {
        items,
        previous,
        next,
        results,
    }
}

/// 링크 윈도우의 [from, to) 경계를 계산합니다.
fn window_bounds(number_of_pages: u64, current_page: u64) -> (u64, u64) {
    if number_of_pages <= 10 {
        return (0, number_of_pages);
    }

    // current_page가 전체 페이지 수를 넘어도 (악의적 쿼리 등)
    // saturating_sub이 마지막 윈도우로 수렴시킵니다.
    let from = if number_of_pages.saturating_sub(current_page) <= 5 {
        // 끝에서 5페이지 이내: 마지막 10개를 고정 표시
        number_of_pages - 10
    } else if current_page <= 5 {
        0
    } else {
        current_page - 5
    };

    (from, (from + 10).min(number_of_pages))
}

/// 기준 URL의 `page` 쿼리 파라미터를 치환한 href를 만듭니다.
fn with_page(base_url: &Url, page: u64) -> String {
    let mut url = base_url.clone();
    let kept: Vec<(String, String)> = base_url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("page", &page.to_string());
    }

    url.to_string()
}

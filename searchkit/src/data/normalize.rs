//! Result normalization
//!
//! Both backends end up in the same `{list, meta}` envelope.

use crate::data::relational::RelationalRaw;
use crate::data::search_engine::SearchResponse;
use crate::data::types::{PageMeta, PageSpec, ResultEnvelope};

/// Paginated results carry the paginator's meta; unpaged results are one page
pub fn normalize_relational(raw: RelationalRaw) -> ResultEnvelope {
    match raw {
        RelationalRaw::Paginated(page) => ResultEnvelope {
            meta: PageMeta {
                total: page.total,
                size: page.per_page,
                page: page.current_page,
                total_page: page.last_page,
            },
            list: page.data,
        },
        RelationalRaw::All(list) => {
            let count = list.len() as u64;
            ResultEnvelope {
                list,
                meta: PageMeta {
                    total: count,
                    size: count,
                    page: 1,
                    total_page: 1,
                },
            }
        }
    }
}

/// `size` falls back to the hit count when unpaged; `total_page` divides by at least 1
pub fn normalize_search(raw: SearchResponse, page: &PageSpec) -> ResultEnvelope {
    let (list, total) = raw.into_sources();
    let size = if page.size > 0 {
        page.size
    } else {
        list.len() as u64
    };
    ResultEnvelope {
        list,
        meta: PageMeta {
            total,
            size,
            page: page.page,
            total_page: total.div_ceil(size.max(1)),
        },
    }
}

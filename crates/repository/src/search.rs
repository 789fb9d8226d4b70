//! Listing search query builder: keyword / price-range / type filters,
//! price sorting, fixed-size pagination.
//!
//! The builder is deliberately pure (SQL text + owned params) so the
//! filter-to-SQL mapping can be tested without a database.

use model::request::{ListingFilter, SortOrder};

/// An owned SQL parameter produced by the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchParam {
    Text(String),
    Int(i64),
}

/// A 1-indexed page over a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(number: Option<u32>, per_page: u32) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            per_page,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.per_page) * i64::from(self.number - 1)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Number of pages needed to show `count` results. Zero results means
    /// zero pages; callers treat an out-of-range request against a non-empty
    /// result set as an error, and an empty set as a valid empty page.
    pub fn total_pages(count: i64, per_page: u32) -> i64 {
        if per_page == 0 {
            return 0;
        }
        (count + i64::from(per_page) - 1) / i64::from(per_page)
    }
}

/// WHERE/ORDER BY fragments plus bound parameters for a listing search.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSearch {
    pub where_clause: String,
    pub order_clause: &'static str,
    pub params: Vec<SearchParam>,
}

impl ListingSearch {
    /// Translates the client filter into SQL. Keyword matches are
    /// case-insensitive substring matches over title, city and locality
    /// (logical OR); price bounds are inclusive on `starting_rent`.
    pub fn build(filter: &ListingFilter) -> Self {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SearchParam> = Vec::new();

        if let Some(keyword) = filter
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            params.push(SearchParam::Text(format!("%{keyword}%")));
            let n = params.len();
            clauses.push(format!(
                "(title ILIKE ${n} OR city ILIKE ${n} OR locality ILIKE ${n})"
            ));
        }

        if let Some(min) = filter.min_price {
            params.push(SearchParam::Int(min));
            clauses.push(format!("starting_rent >= ${}", params.len()));
        }

        if let Some(max) = filter.max_price {
            params.push(SearchParam::Int(max));
            clauses.push(format!("starting_rent <= ${}", params.len()));
        }

        if let Some(property_type) = filter.property_type {
            params.push(SearchParam::Text(property_type.as_str().to_string()));
            clauses.push(format!("property_type = ${}", params.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let order_clause = match filter.sort {
            Some(SortOrder::PriceAsc) => " ORDER BY starting_rent ASC",
            Some(SortOrder::PriceDesc) => " ORDER BY starting_rent DESC",
            None => " ORDER BY created_at DESC",
        };

        Self {
            where_clause,
            order_clause,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::PropertyType;

    #[test]
    fn empty_filter_builds_no_predicates() {
        let search = ListingSearch::build(&ListingFilter::default());
        assert_eq!(search.where_clause, "");
        assert!(search.params.is_empty());
        assert_eq!(search.order_clause, " ORDER BY created_at DESC");
    }

    #[test]
    fn keyword_matches_three_fields_with_one_param() {
        let filter = ListingFilter {
            keyword: Some("Koramangala".into()),
            ..Default::default()
        };
        let search = ListingSearch::build(&filter);
        assert_eq!(
            search.where_clause,
            " WHERE (title ILIKE $1 OR city ILIKE $1 OR locality ILIKE $1)"
        );
        assert_eq!(search.params, vec![SearchParam::Text("%Koramangala%".into())]);
    }

    #[test]
    fn blank_keyword_is_ignored() {
        let filter = ListingFilter {
            keyword: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(ListingSearch::build(&filter).where_clause, "");
    }

    #[test]
    fn price_bounds_are_inclusive_and_numbered_in_order() {
        let filter = ListingFilter {
            keyword: Some("pg".into()),
            min_price: Some(4000),
            max_price: Some(9000),
            property_type: Some(PropertyType::Hostel),
            sort: Some(SortOrder::PriceAsc),
            page: None,
        };
        let search = ListingSearch::build(&filter);
        assert_eq!(
            search.where_clause,
            " WHERE (title ILIKE $1 OR city ILIKE $1 OR locality ILIKE $1) \
             AND starting_rent >= $2 AND starting_rent <= $3 AND property_type = $4"
        );
        assert_eq!(search.params.len(), 4);
        assert_eq!(search.params[3], SearchParam::Text("Hostel".into()));
        assert_eq!(search.order_clause, " ORDER BY starting_rent ASC");
    }

    #[test]
    fn page_math_is_one_indexed_with_fixed_size() {
        let page = Page::new(Some(2), 4);
        assert_eq!(page.offset(), 4);
        assert_eq!(page.limit(), 4);
        // 7 results at 4 per page -> 2 pages
        assert_eq!(Page::total_pages(7, 4), 2);
        assert_eq!(Page::total_pages(8, 4), 2);
        assert_eq!(Page::total_pages(9, 4), 3);
        assert_eq!(Page::total_pages(0, 4), 0);
    }

    #[test]
    fn page_defaults_to_first() {
        let page = Page::new(None, 4);
        assert_eq!(page.number, 1);
        assert_eq!(page.offset(), 0);
    }
}

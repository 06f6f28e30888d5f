/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Page size actually served. Requests asking for more are cut down to this.
pub const MAX_PAGE_SIZE: i64 = 15;

/// Largest `limit` the query validator accepts before rejecting the request.
/// Anything between MAX_PAGE_SIZE and this passes validation but is capped when paging.
pub const MAX_QUERY_LIMIT: i64 = 100;

/// Movies released within this many days count as new releases
pub const NEW_RELEASE_WINDOW_DAYS: i64 = 21;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: u64 = 6;

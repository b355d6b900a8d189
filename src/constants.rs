pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v18.0";

pub mod env {

    pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";

    pub const BUSINESS_ACCOUNT_ID: &str = "BUSINESS_ACCOUNT_ID";
}

pub mod fields {
    /// Field list for `/{hashtag-id}/recent_media`, already percent-encoded.
    pub const RECENT_MEDIA: &str = "id%2Cmedia_type%2Ccomments_count%2Clike_count%2Ccaption%2Ctimestamp%2Cmedia_url%2Cpermalink%2Cchildren{id%2Ctimestamp%2Cmedia_url}";

    /// Media sub-selection for `business_discovery.username(..)`.
    pub const BUSINESS_DISCOVERY_MEDIA: &str = "id%2Cusername%2Ccaption%2Ccomments_count%2Clike_count%2Cmedia_product_type%2Cmedia_url%2Cpermalink%2Ctimestamp";
}

pub mod artifacts {

    pub const CSV_COLUMNS: [&str; 8] = [
        "id",
        "media_type",
        "comments_count",
        "like_count",
        "caption",
        "timestamp",
        "media_url",
        "permalink",
    ];

    /// Characters removed from captions before they land in a CSV row.
    pub const CAPTION_STRIP: &[char] = &['\n', '\r', '\u{2615}', ','];

    pub const BUSINESS_KEY_SUFFIX: &str = "_business";

    pub const RUN_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
}

pub mod store {

    /// Hashtag records are stamped in UTC+09:00 (Asia/Tokyo has no DST).
    pub const RECORD_UTC_OFFSET_SECS: i32 = 9 * 3600;
}

pub mod logs {

    pub const FILE_PREFIX: &str = "app.log";

    pub const COMPRESSED_EXTENSION: &str = "zst";

    pub const COMPRESSION_LEVEL: i32 = 3;

    pub const RATE_LIMIT_NOTICE: &str = "Graph API rate limit: ~200 calls/hour per user; once exceeded the limit lifts after about 40 minutes";
}

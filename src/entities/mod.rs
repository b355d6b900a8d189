pub mod ig_hashtags;

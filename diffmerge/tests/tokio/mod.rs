// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod publisher_stream_tests;
pub mod sorted_diff_tests;
pub mod stream_publisher_tests;

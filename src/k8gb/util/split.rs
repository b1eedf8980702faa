/*
 * Copyright (C) 2024 The k8gb Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */


use regex::Regex;

/// Splits `input` so that every match of `separator` starts a new piece,
/// keeping the matched text. Empty pieces are dropped.
///
/// `split_after("a.b.c", &Regex::new(r"\.")?)` yields `["a", ".b", ".c"]`.
pub fn split_after(input: &str, separator: &Regex) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for found in separator.find_iter(input) {
        if found.start() > start {
            pieces.push(input[start..found.start()].to_string());
        }
        start = found.start();
    }
    if start < input.len() {
        pieces.push(input[start..].to_string());
    }
    pieces
}

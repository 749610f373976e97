// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Various utilities.

use log::warn;
use serde_yaml::{Mapping, Value};

/// Merge two nested mappings.
///
/// The values from `src` are merged into `dest`. With `overwrite`, scalar values from `src`
/// replace the ones in `dest`, otherwise only missing keys are added.
pub fn merge_mappings(src: Mapping, dest: &mut Mapping, overwrite: bool) {
    for (src_key, src_value) in src.into_iter() {
        match src_value {
            Value::Mapping(src_mapping) => match dest.get_mut(&src_key) {
                Some(Value::Mapping(dest_mapping)) => {
                    merge_mappings(src_mapping, dest_mapping, overwrite);
                }
                Some(dest_value) => {
                    warn!(
                        "Type mismatch while merging mappings. Expected {:?} to be a Mapping. Overriding destination.",
                        dest_value
                    );
                    *dest_value = Value::Mapping(src_mapping);
                }
                None => {
                    let _ = dest.insert(src_key, Value::Mapping(src_mapping));
                }
            },
            other => {
                if overwrite || !dest.contains_key(&src_key) {
                    let _ = dest.insert(src_key, other);
                }
            }
        }
    }
}

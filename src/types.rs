// Copyright 2025 Fernando Borretti
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

pub mod card;
pub mod card_verse;
pub mod changeset;
pub mod collection;
pub mod date;
pub mod quality;
pub mod timestamp;
pub mod verse;

/// Generate a fresh record identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

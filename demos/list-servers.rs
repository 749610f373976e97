// Copyright 2019 Dmitry Tantsur <divius.inside@gmail.com>
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

use std::env;

#[tokio::main]
async fn main() {
    env_logger::init();
    let with_metadata = env::args().any(|arg| arg == "--metadata");

    let compute =
        oscompute::from_env().expect("Failed to create a Compute client from the environment");

    let servers = compute.servers(()).await.expect("Failed to list servers");
    for srv in &servers {
        println!(
            "ID = {}, Name = {}, Status = {}, Flavor = {}",
            srv.id(),
            srv.name().unwrap_or("-"),
            srv.status().unwrap_or("-"),
            srv.flavor_id().unwrap_or("-"),
        );
        if with_metadata {
            let metadata = srv
                .list_metadata()
                .await
                .expect("Failed to fetch server metadata");
            for (key, value) in metadata {
                println!("    {} = {}", key, value);
            }
        }
    }

    for flavor in compute.flavors().await.expect("Failed to list flavors") {
        println!("Flavor {}", serde_json::Value::Object(flavor));
    }
    println!("Done listing");
}

//! Volume operations: asynchronous `state.sls` jobs plus one synchronous
//! device query.

use crate::client::core::SaltClient;
use crate::utils::json_path::get_path;
use crate::{Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

impl SaltClient {
    /// Spawn a job, asynchronously, to prepare the volume on the given node.
    ///
    /// Returns the Salt job ID; poll it with
    /// [`poll_job`](SaltClient::poll_job).
    pub async fn prepare_volume(
        &self,
        node_name: &str,
        volume_name: &str,
        saltenv: &str,
    ) -> Result<String> {
        info!(
            node = node_name,
            volume = volume_name,
            saltenv,
            "preparing volume"
        );
        self.submit_state_job(
            "prepare volume",
            "metalk8s.volumes",
            node_name,
            volume_name,
            saltenv,
        )
        .await
    }

    /// Spawn a job, asynchronously, to unprepare the volume on the given
    /// node.
    pub async fn unprepare_volume(
        &self,
        node_name: &str,
        volume_name: &str,
        saltenv: &str,
    ) -> Result<String> {
        info!(
            node = node_name,
            volume = volume_name,
            saltenv,
            "unpreparing volume"
        );
        self.submit_state_job(
            "unprepare volume",
            "metalk8s.volumes.unprepared",
            node_name,
            volume_name,
            saltenv,
        )
        .await
    }

    async fn submit_state_job(
        &self,
        op: &str,
        mods: &str,
        node_name: &str,
        volume_name: &str,
        saltenv: &str,
    ) -> Result<String> {
        let payload = json!({
            "client": "local_async",
            "tgt": node_name,
            "fun": "state.sls",
            "kwarg": {
                "mods": mods,
                "saltenv": saltenv,
                "pillar": {"volume": volume_name},
            },
        });

        let context =
            || format!("{op} failed (env={saltenv}, target={node_name}, volume={volume_name})");

        let ans = self
            .authenticated_request(Method::POST, "/", Some(&payload))
            .await
            .map_err(|e| e.with_operation(context()))?;

        get_path(&ans, "return[0].jid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::shape("return[0].jid").with_operation(context()))
    }

    /// Return the size in bytes of the given device on the given node.
    ///
    /// This request is synchronous.
    pub async fn get_volume_size(&self, node_name: &str, device_path: &str) -> Result<i64> {
        let payload = json!({
            "client": "local",
            "tgt": node_name,
            "fun": "disk.dump",
            "arg": device_path,
            "timeout": 1,
        });

        info!(node = node_name, device = device_path, "querying device size");

        let context = || format!("disk.dump failed (target={node_name}, path={device_path})");

        let ans = self
            .authenticated_request(Method::POST, "/", Some(&payload))
            .await
            .map_err(|e| e.with_operation(context()))?;

        // The node's entry is absent when it was not a valid target.
        let size = get_path(&ans, "return[0]")
            .and_then(Value::as_object)
            .and_then(|result| result.get(node_name))
            .and_then(Value::as_object)
            .and_then(|node_result| node_result.get("getsize64"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::shape(format!("return[0][{node_name}].getsize64")).with_operation(context())
            })?;

        size.parse().map_err(|_| {
            Error::shape(format!("return[0][{node_name}].getsize64")).with_operation(context())
        })
    }
}

//! Entry resolution: naming operations against the remote tree.
//!
//! Every name is run through the encoder before it leaves the adapter, so
//! an overlong name fails locally with `EncodingOverflow` and never reaches
//! the service.

use tracing::debug;

use crate::error::FsResult;
use crate::mount::MountContext;
use crate::name;
use crate::remote::{op, RemoteCall, RpcClient};
use crate::types::{EntriesPage, EntryInfo, Inode, NodeKind};

/// Lookup, create, unlink, rmdir and link against one remote client.
pub struct EntryResolver<'a, C> {
    client: &'a RpcClient<C>,
}

impl<'a, C: RemoteCall> EntryResolver<'a, C> {
    pub fn new(client: &'a RpcClient<C>) -> Self {
        Self { client }
    }

    /// Entries of directory `inode`, at most one page.
    pub fn list(&self, ctx: &MountContext, inode: Inode) -> FsResult<EntriesPage> {
        self.client.list(ctx, inode)
    }

    /// Resolve `name` under `parent`.
    ///
    /// A missing child is reported by the service as a nonzero status and
    /// surfaces as `RemoteCall`.
    pub fn lookup(&self, ctx: &MountContext, parent: Inode, name: &[u8]) -> FsResult<EntryInfo> {
        let encoded = name::encode_entry_name(name)?;
        self.client.lookup(ctx, parent, encoded)
    }

    /// Create a file or directory and return the inode the service assigned.
    pub fn create(
        &self,
        ctx: &MountContext,
        parent: Inode,
        name: &[u8],
        kind: NodeKind,
    ) -> FsResult<Inode> {
        let encoded = name::encode_entry_name(name)?;
        let inode = self.client.create(ctx, parent, kind, encoded)?;
        debug!(parent, inode, %kind, "Created entry");
        Ok(inode)
    }

    /// Remove a file name.
    pub fn unlink(&self, ctx: &MountContext, parent: Inode, name: &[u8]) -> FsResult<()> {
        self.remove(ctx, op::UNLINK, parent, name)
    }

    /// Remove an empty directory.
    pub fn rmdir(&self, ctx: &MountContext, parent: Inode, name: &[u8]) -> FsResult<()> {
        self.remove(ctx, op::RMDIR, parent, name)
    }

    /// Remove `name` with the operation matching its kind.
    pub fn remove_kind(
        &self,
        ctx: &MountContext,
        parent: Inode,
        name: &[u8],
        kind: NodeKind,
    ) -> FsResult<()> {
        match kind {
            NodeKind::File => self.unlink(ctx, parent, name),
            NodeKind::Directory => self.rmdir(ctx, parent, name),
        }
    }

    fn remove(
        &self,
        ctx: &MountContext,
        operation: &'static str,
        parent: Inode,
        name: &[u8],
    ) -> FsResult<()> {
        let encoded = name::encode_entry_name(name)?;
        self.client.invoke_unit(
            ctx,
            operation,
            &[("parent", parent.to_string()), ("name", encoded)],
        )
    }

    /// Give `source` an additional name under `parent`.
    pub fn link(
        &self,
        ctx: &MountContext,
        source: Inode,
        parent: Inode,
        name: &[u8],
    ) -> FsResult<()> {
        let encoded = name::encode_entry_name(name)?;
        self.client.invoke_unit(
            ctx,
            op::LINK,
            &[
                ("source", source.to_string()),
                ("parent", parent.to_string()),
                ("name", encoded),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsError;
    use crate::remote::tests::MockRemote;
    use crate::remote::Reply;
    use crate::types::{MAX_NAME_LEN, ROOT_INODE};
    use serde_json::json;

    fn ctx() -> MountContext {
        MountContext::mount("tok").unwrap()
    }

    #[test]
    fn test_lookup_encodes_name() {
        let client = RpcClient::new(MockRemote::new());
        client
            .transport()
            .push_ok(json!({"entry_type": 4, "ino": 1003}));
        let resolver = EntryResolver::new(&client);

        let info = resolver.lookup(&ctx(), ROOT_INODE, b"my dir").unwrap();
        assert_eq!(info.kind, NodeKind::Directory);
        assert_eq!(info.inode, 1003);
        assert_eq!(
            client.transport().calls()[0].param("name"),
            Some("my%20dir")
        );
    }

    #[test]
    fn test_lookup_failure_is_remote_call() {
        let client = RpcClient::new(MockRemote::new());
        client.transport().push(Ok(Reply::status(1)));
        let resolver = EntryResolver::new(&client);

        let err = resolver.lookup(&ctx(), ROOT_INODE, b"missing").unwrap_err();
        assert!(err.is_remote());
    }

    #[test]
    fn test_overlong_name_never_reaches_remote() {
        let client = RpcClient::new(MockRemote::new());
        let resolver = EntryResolver::new(&client);

        let name = vec![b'-'; MAX_NAME_LEN + 1];
        let err = resolver
            .create(&ctx(), ROOT_INODE, &name, NodeKind::File)
            .unwrap_err();
        assert!(matches!(err, FsError::EncodingOverflow { .. }));
        assert!(client.transport().calls().is_empty());
    }

    #[test]
    fn test_non_utf8_name_never_reaches_remote() {
        let client = RpcClient::new(MockRemote::new());
        let resolver = EntryResolver::new(&client);

        let err = resolver
            .create(&ctx(), ROOT_INODE, &[b'a', 0xff], NodeKind::File)
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidName(_)));
        assert!(resolver
            .link(&ctx(), 1001, ROOT_INODE, &[0xc3])
            .is_err());
        assert!(client.transport().calls().is_empty());
    }

    #[test]
    fn test_create_params_in_order() {
        let client = RpcClient::new(MockRemote::new());
        client.transport().push_ok(json!(1010));
        let resolver = EntryResolver::new(&client);

        let ino = resolver
            .create(&ctx(), ROOT_INODE, b"notes.txt", NodeKind::File)
            .unwrap();
        assert_eq!(ino, 1010);

        let call = &client.transport().calls()[0];
        let keys: Vec<&str> = call.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["parent", "type", "name"]);
        assert_eq!(call.param("type"), Some("file"));
        assert_eq!(call.param("name"), Some("notes%2etxt"));
    }

    #[test]
    fn test_unlink_and_rmdir_use_their_tags() {
        let client = RpcClient::new(MockRemote::new());
        client.transport().push(Ok(Reply::empty()));
        client.transport().push(Ok(Reply::empty()));
        let resolver = EntryResolver::new(&client);

        resolver
            .remove_kind(&ctx(), ROOT_INODE, b"f", NodeKind::File)
            .unwrap();
        resolver
            .remove_kind(&ctx(), ROOT_INODE, b"d", NodeKind::Directory)
            .unwrap();

        let calls = client.transport().calls();
        assert_eq!(calls[0].operation, "unlink");
        assert_eq!(calls[1].operation, "rmdir");
        assert_eq!(calls[1].param("parent"), Some("1000"));
    }

    #[test]
    fn test_link_encodes_name() {
        let client = RpcClient::new(MockRemote::new());
        client.transport().push(Ok(Reply::empty()));
        let resolver = EntryResolver::new(&client);

        resolver
            .link(&ctx(), 1005, ROOT_INODE, b"alias name")
            .unwrap();

        let call = &client.transport().calls()[0];
        assert_eq!(call.operation, "link");
        assert_eq!(call.param("source"), Some("1005"));
        assert_eq!(call.param("parent"), Some("1000"));
        assert_eq!(call.param("name"), Some("alias%20name"));
    }

    #[test]
    fn test_no_retry_on_failure() {
        let client = RpcClient::new(MockRemote::new());
        client.transport().push(Ok(Reply::status(3)));
        client.transport().push(Ok(Reply::empty()));
        let resolver = EntryResolver::new(&client);

        assert!(resolver.rmdir(&ctx(), ROOT_INODE, b"d").is_err());
        assert_eq!(client.transport().calls().len(), 1);
    }
}

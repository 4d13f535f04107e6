//! Solidity ABI surface of the account (LSP0 / ERC725) and of the key manager (LSP6).
//!
//! The classifier decodes payloads against `ILSP0`; the reference account and the on-chain
//! account adapter use the same definitions to encode and route calls.

use stylus_sdk::alloy_sol_types::sol;

sol! {
    interface ILSP0 {
        function owner() external view returns (address);
        function pendingOwner() external view returns (address);
        function renounceOwnershipStartedAt() external view returns (uint256);

        function getData(bytes32 dataKey) external view returns (bytes memory dataValue);
        function getDataBatch(bytes32[] memory dataKeys) external view returns (bytes[] memory dataValues);
        function setData(bytes32 dataKey, bytes memory dataValue) external payable;
        function setDataBatch(bytes32[] memory dataKeys, bytes[] memory dataValues) external payable;

        function execute(uint256 operationType, address target, uint256 value, bytes memory data)
            external
            payable
            returns (bytes memory);

        function transferOwnership(address newOwner) external;
        function acceptOwnership() external;
        function renounceOwnership() external;
    }

    interface ILSP1 {
        function universalReceiver(bytes32 typeId, bytes memory receivedData)
            external
            payable
            returns (bytes memory);
    }

    interface IERC165 {
        function supportsInterface(bytes4 interfaceId) external view returns (bool);
    }

    interface IERC1271 {
        function isValidSignature(bytes32 dataHash, bytes memory signature) external view returns (bytes4);
    }

    interface ILSP6 {
        function target() external view returns (address);
        function getNonce(address from, uint128 channelId) external view returns (uint256);
        function execute(bytes calldata payload) external payable returns (bytes memory);
        function executeRelayCall(bytes calldata signature, uint256 nonce, bytes calldata payload)
            external
            payable
            returns (bytes memory);
    }
}
